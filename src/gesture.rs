//! Drag gesture classification.
//!
//! [`classify`] turns the offset and velocity of a released drag into a
//! discrete [`Outcome`].  It is pure and knows nothing about terminals,
//! animation or the stack, so it can be tested against boundary values
//! directly.  [`VelocityTracker`] derives the release velocity from the
//! timestamped drag samples the input layer feeds it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default horizontal distance (drag units) past which a release commits.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 120.0;

/// Default release velocity (drag units per second) that commits regardless
/// of distance.
pub const DEFAULT_VELOCITY_THRESHOLD: f32 = 600.0;

/// A committed swipe decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Like,
    Reject,
}

impl Decision {
    pub fn liked(self) -> bool {
        self == Decision::Like
    }

    /// +1 for Like (right), -1 for Reject (left).
    pub fn direction(self) -> f32 {
        match self {
            Decision::Like => 1.0,
            Decision::Reject => -1.0,
        }
    }
}

/// Result of classifying a released drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Like,
    Reject,
    /// Not far or fast enough; the card springs back.
    Cancel,
}

impl Outcome {
    pub fn decision(self) -> Option<Decision> {
        match self {
            Outcome::Like => Some(Decision::Like),
            Outcome::Reject => Some(Decision::Reject),
            Outcome::Cancel => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub distance: f32,
    pub velocity: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE_THRESHOLD,
            velocity: DEFAULT_VELOCITY_THRESHOLD,
        }
    }
}

/// Classify a released drag.
///
/// Both comparisons are strict: a drag that stops exactly on a threshold
/// cancels.  A release that satisfies both directions at once (far right
/// but flung left, or the reverse) resolves as Like.
pub fn classify(offset: f32, velocity: f32, thresholds: Thresholds) -> Outcome {
    if offset > thresholds.distance || velocity > thresholds.velocity {
        Outcome::Like
    } else if offset < -thresholds.distance || velocity < -thresholds.velocity {
        Outcome::Reject
    } else {
        Outcome::Cancel
    }
}

// ---------------------------------------------------------------------------
// Velocity tracking
// ---------------------------------------------------------------------------

/// Only samples this recent count towards the release velocity.
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Estimates drag velocity from the most recent position samples.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(Instant, f32)>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: Instant, offset: f32) {
        self.samples.push_back((at, offset));
        while let Some(&(first, _)) = self.samples.front() {
            if at.saturating_duration_since(first) > VELOCITY_WINDOW {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Units per second over the window ending at `now`.  Zero when the
    /// pointer has been still for longer than the window.
    pub fn velocity(&self, now: Instant) -> f32 {
        let recent: Vec<_> = self
            .samples
            .iter()
            .filter(|(at, _)| now.saturating_duration_since(*at) <= VELOCITY_WINDOW)
            .collect();

        let (Some(first), Some(last)) = (recent.first(), recent.last()) else {
            return 0.0;
        };
        let dt = last.0.saturating_duration_since(first.0).as_secs_f32();
        if dt <= f32::EPSILON {
            return 0.0;
        }
        (last.1 - first.1) / dt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
