//! Per-card drag and exit animation.
//!
//! A [`CardAnimationController`] is bound to the card on top of the stack.
//! It is an explicit state machine:
//!
//! ```text
//! Idle ──pointer_down──► Dragging ──release──► classify()
//!  ▲                                            │
//!  │            Cancel                          │ Like / Reject
//!  └──── Springback ◄───────────────────────────┼──────────────► Exiting ──► Removed
//!                                                                  (commit)
//! ```
//!
//! Animation time only moves through [`CardAnimationController::tick`].  The
//! tick that finishes the exit animation is the one that returns the
//! [`SwipeCommit`], so the logical removal can never run ahead of the visual
//! one.

use std::time::{Duration, Instant};

use crate::gesture::{classify, Decision, Outcome, Thresholds, VelocityTracker};
use crate::source::ArticleId;

pub const EXIT_DURATION: Duration = Duration::from_millis(400);
pub const SPRINGBACK_DURATION: Duration = Duration::from_millis(250);

/// How far off-centre an exiting card travels.
pub const EXIT_DISTANCE: f32 = 280.0;
const EXIT_ROTATION: f32 = 8.0;
const EXIT_SCALE: f32 = 0.95;

/// Drag rotation reaches `MAX_DRAG_ROTATION` degrees at this offset.
const ROTATION_RANGE: f32 = 300.0;
const MAX_DRAG_ROTATION: f32 = 12.0;

/// Opacity starts dropping past `FADE_START` and bottoms out at
/// `MIN_DRAG_OPACITY` at `ROTATION_RANGE`.
const FADE_START: f32 = 150.0;
const MIN_DRAG_OPACITY: f32 = 0.4;

/// Like/Reject badges fade in between these offsets.
const BADGE_START: f32 = 60.0;
const BADGE_FULL: f32 = 150.0;

/// Keyboard flings release at this multiple of the velocity threshold.
const FLING_FACTOR: f32 = 2.0;

/// Visual state of a card for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    /// Horizontal offset in drag units; positive is right.
    pub offset: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub opacity: f32,
    pub scale: f32,
}

impl CardTransform {
    pub const NEUTRAL: CardTransform = CardTransform {
        offset: 0.0,
        rotation: 0.0,
        opacity: 1.0,
        scale: 1.0,
    };

    /// Transform of a card held at `offset`.
    pub fn at_offset(offset: f32) -> Self {
        let rotation = (offset / ROTATION_RANGE).clamp(-1.0, 1.0) * MAX_DRAG_ROTATION;
        let distance = offset.abs();
        let opacity = if distance <= FADE_START {
            1.0
        } else {
            let t = ((distance - FADE_START) / (ROTATION_RANGE - FADE_START)).min(1.0);
            lerp(1.0, MIN_DRAG_OPACITY, t)
        };
        Self {
            offset,
            rotation,
            opacity,
            scale: 1.0,
        }
    }

    fn exit_target(decision: Decision) -> Self {
        let dir = decision.direction();
        Self {
            offset: dir * EXIT_DISTANCE,
            rotation: dir * EXIT_ROTATION,
            opacity: 0.0,
            scale: EXIT_SCALE,
        }
    }

    fn lerp_to(self, to: CardTransform, t: f32) -> Self {
        Self {
            offset: lerp(self.offset, to.offset, t),
            rotation: lerp(self.rotation, to.rotation, t),
            opacity: lerp(self.opacity, to.opacity, t),
            scale: lerp(self.scale, to.scale, t),
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Cubic ease-out over `t` in `[0, 1]`.
fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0)
}

#[derive(Debug, Clone)]
pub enum CardPhase {
    Idle,
    Dragging {
        offset: f32,
        tracker: VelocityTracker,
    },
    Springback {
        from: f32,
        elapsed: Duration,
    },
    Exiting {
        decision: Decision,
        from: CardTransform,
        elapsed: Duration,
    },
    Removed {
        decision: Decision,
    },
}

/// Emitted exactly once, when the exit animation of a card completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeCommit {
    pub article_id: ArticleId,
    pub decision: Decision,
}

#[derive(Debug, Clone)]
pub struct CardAnimationController {
    article_id: ArticleId,
    thresholds: Thresholds,
    phase: CardPhase,
}

impl CardAnimationController {
    pub fn new(article_id: ArticleId, thresholds: Thresholds) -> Self {
        Self {
            article_id,
            thresholds,
            phase: CardPhase::Idle,
        }
    }

    pub fn article_id(&self) -> &ArticleId {
        &self.article_id
    }

    pub fn phase(&self) -> &CardPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, CardPhase::Dragging { .. })
    }

    /// True once a decision has been made (exiting or removed).
    pub fn is_resolved(&self) -> bool {
        matches!(
            self.phase,
            CardPhase::Exiting { .. } | CardPhase::Removed { .. }
        )
    }

    /// Start a drag.  Ignored unless the card is idle and on top.
    pub fn pointer_down(&mut self, is_top: bool, now: Instant) -> bool {
        if !is_top || !matches!(self.phase, CardPhase::Idle) {
            return false;
        }
        let mut tracker = VelocityTracker::new();
        tracker.push(now, 0.0);
        self.phase = CardPhase::Dragging {
            offset: 0.0,
            tracker,
        };
        true
    }

    /// Move the dragged card to `offset`.  No-op outside a drag.
    pub fn drag_to(&mut self, offset: f32, now: Instant) {
        if let CardPhase::Dragging {
            offset: current,
            tracker,
        } = &mut self.phase
        {
            *current = offset;
            tracker.push(now, offset);
        }
    }

    /// End the drag and classify it.  Returns `None` outside a drag.
    pub fn release(&mut self, now: Instant) -> Option<Outcome> {
        let CardPhase::Dragging { offset, tracker } = &self.phase else {
            return None;
        };
        let offset = *offset;
        let velocity = tracker.velocity(now);
        Some(self.resolve(offset, velocity))
    }

    /// Keyboard shortcut: commit `decision` without a pointer drag.
    pub fn fling(&mut self, is_top: bool, decision: Decision) -> bool {
        if !is_top || !matches!(self.phase, CardPhase::Idle) {
            return false;
        }
        let velocity = decision.direction() * self.thresholds.velocity * FLING_FACTOR;
        self.resolve(0.0, velocity);
        true
    }

    fn resolve(&mut self, offset: f32, velocity: f32) -> Outcome {
        let outcome = classify(offset, velocity, self.thresholds);
        self.phase = match outcome.decision() {
            Some(decision) => {
                tracing::debug!(article = %self.article_id, ?decision, offset, velocity, "card exiting");
                CardPhase::Exiting {
                    decision,
                    from: CardTransform::at_offset(offset),
                    elapsed: Duration::ZERO,
                }
            }
            None if offset == 0.0 => CardPhase::Idle,
            None => CardPhase::Springback {
                from: offset,
                elapsed: Duration::ZERO,
            },
        };
        outcome
    }

    /// Advance running animations by `dt`.
    ///
    /// Returns the commit on the tick that completes the exit animation and
    /// `None` on every other tick.
    pub fn tick(&mut self, dt: Duration) -> Option<SwipeCommit> {
        match &mut self.phase {
            CardPhase::Springback { elapsed, .. } => {
                *elapsed += dt;
                if *elapsed >= SPRINGBACK_DURATION {
                    self.phase = CardPhase::Idle;
                }
                None
            }
            CardPhase::Exiting {
                decision, elapsed, ..
            } => {
                *elapsed += dt;
                if *elapsed < EXIT_DURATION {
                    return None;
                }
                let decision = *decision;
                self.phase = CardPhase::Removed { decision };
                Some(SwipeCommit {
                    article_id: self.article_id.clone(),
                    decision,
                })
            }
            _ => None,
        }
    }

    pub fn transform(&self) -> CardTransform {
        match &self.phase {
            CardPhase::Idle => CardTransform::NEUTRAL,
            CardPhase::Dragging { offset, .. } => CardTransform::at_offset(*offset),
            CardPhase::Springback { from, elapsed } => {
                let t = ease_out(progress(*elapsed, SPRINGBACK_DURATION));
                CardTransform::at_offset(lerp(*from, 0.0, t))
            }
            CardPhase::Exiting {
                decision,
                from,
                elapsed,
            } => {
                let t = ease_out(progress(*elapsed, EXIT_DURATION));
                from.lerp_to(CardTransform::exit_target(*decision), t)
            }
            CardPhase::Removed { decision } => CardTransform::exit_target(*decision),
        }
    }

    /// Which badge to show over the card and how strongly.
    pub fn badge(&self) -> Option<(Decision, f32)> {
        if self.is_resolved() {
            return None;
        }
        let offset = self.transform().offset;
        let strength = ((offset.abs() - BADGE_START) / (BADGE_FULL - BADGE_START)).clamp(0.0, 1.0);
        if strength <= 0.0 {
            return None;
        }
        let decision = if offset > 0.0 {
            Decision::Like
        } else {
            Decision::Reject
        };
        Some((decision, strength))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
