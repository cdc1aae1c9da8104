use std::time::{Duration, Instant};

use ratatui::layout::{Position, Rect};

use crate::card::CardAnimationController;
use crate::engine::FeedEngine;
use crate::gesture::{Decision, Outcome, Thresholds};

pub struct App {
    pub engine: FeedEngine,
    /// Controller for the card on top of the stack.  Lower cards have none
    /// and are inert.
    card: Option<CardAnimationController>,
    thresholds: Thresholds,
    units_per_column: f32,
    /// Column where the current mouse drag started.
    drag_origin: Option<u16>,
    /// Screen area of the top card as last drawn, for mouse hit-testing.
    pub card_area: Rect,
    /// Whether the reset confirmation dialog is open.
    pub confirm_reset: bool,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    /// Frame counter, drives the spinner.
    pub frame: u64,
}

impl App {
    pub fn new(engine: FeedEngine, thresholds: Thresholds, units_per_column: f32) -> Self {
        Self {
            engine,
            card: None,
            thresholds,
            units_per_column,
            drag_origin: None,
            card_area: Rect::default(),
            confirm_reset: false,
            quit: false,
            status: "Loading feed…".into(),
            frame: 0,
        }
    }

    pub fn card(&self) -> Option<&CardAnimationController> {
        self.card.as_ref()
    }

    pub fn units_per_column(&self) -> f32 {
        self.units_per_column
    }

    /// Keep the controller bound to whatever is currently on top.
    fn sync_card(&mut self) {
        let top = self.engine.store().top().map(|a| a.id.clone());
        match (top, &self.card) {
            (None, _) => self.card = None,
            (Some(id), Some(card)) if card.article_id() == &id => {}
            (Some(id), _) => {
                self.drag_origin = None;
                self.card = Some(CardAnimationController::new(id, self.thresholds));
            }
        }
    }

    fn card_is_top(&self) -> bool {
        match (&self.card, self.engine.store().top()) {
            (Some(card), Some(top)) => card.article_id() == &top.id,
            _ => false,
        }
    }

    // -- per-frame -----------------------------------------------------------

    /// Apply finished network calls, advance animations and commit any card
    /// whose exit animation completed.
    pub fn tick(&mut self, dt: Duration) {
        self.frame = self.frame.wrapping_add(1);
        self.engine.pump();
        self.sync_card();

        let commit = self.card.as_mut().and_then(|card| card.tick(dt));
        if let Some(commit) = commit {
            let decision = commit.decision;
            if let Some(article) = self.engine.commit_swipe(commit) {
                self.status = match decision {
                    Decision::Like => format!("Liked: {}", article.title),
                    Decision::Reject => format!("Skipped: {}", article.title),
                };
            }
            self.sync_card();
        }

        if !self.engine.session_active() {
            self.status = "Session expired. Please log in again.".into();
            self.quit = true;
        }
    }

    // -- pointer -------------------------------------------------------------

    pub fn pointer_down(&mut self, column: u16, row: u16, now: Instant) {
        if self.confirm_reset
            || self.engine.is_loading()
            || !self.card_area.contains(Position::new(column, row))
        {
            return;
        }
        let is_top = self.card_is_top();
        if let Some(card) = self.card.as_mut() {
            if card.pointer_down(is_top, now) {
                self.drag_origin = Some(column);
            }
        }
    }

    pub fn pointer_drag(&mut self, column: u16, now: Instant) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        let offset = (f32::from(column) - f32::from(origin)) * self.units_per_column;
        if let Some(card) = self.card.as_mut() {
            card.drag_to(offset, now);
        }
    }

    pub fn pointer_up(&mut self, now: Instant) {
        if self.drag_origin.take().is_none() {
            return;
        }
        let outcome = self.card.as_mut().and_then(|card| card.release(now));
        if outcome == Some(Outcome::Cancel) {
            self.status = "Drag further or faster to decide".into();
        }
    }

    // -- keyboard actions ----------------------------------------------------

    /// Fling the top card.  Ignored while the dialog is open or the stack
    /// is hidden behind the spinner.
    pub fn swipe(&mut self, decision: Decision) {
        if self.confirm_reset || self.engine.is_loading() {
            return;
        }
        let is_top = self.card_is_top();
        if let Some(card) = self.card.as_mut() {
            card.fling(is_top, decision);
        }
    }

    pub fn request_reset(&mut self) {
        self.confirm_reset = true;
    }

    pub fn cancel_reset(&mut self) {
        self.confirm_reset = false;
    }

    pub fn confirm_reset(&mut self) {
        if !self.confirm_reset {
            return;
        }
        self.confirm_reset = false;
        if self.engine.reset() {
            // The cards on screen are about to be replaced; abandon any drag
            // or exit so nothing from the old stack gets recorded.
            self.card = None;
            self.drag_origin = None;
            self.sync_card();
            self.status = "Resetting swipe history…".into();
        }
    }

    pub fn logout(&mut self) {
        self.engine.logout();
        self.status = "Logged out".into();
        self.quit = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::card::{CardPhase, EXIT_DURATION};
    use crate::coordinator::DEFAULT_REFILL_DEBOUNCE;
    use crate::session::TokenSession;
    use crate::source::mock::MockFeedService;
    use crate::source::{make_article, ArticleId};

    async fn app_with(ids: &[i64]) -> (App, Arc<MockFeedService>) {
        let service = MockFeedService::new();
        service.push_feed(Ok(ids.iter().map(|&id| make_article(id, "t")).collect()));
        let mut engine = FeedEngine::new(
            service.clone(),
            Arc::new(TokenSession::new("token")),
            DEFAULT_REFILL_DEBOUNCE,
        );
        engine.start();
        for _ in 0..3 {
            engine.process_next().await;
        }
        let mut app = App::new(engine, Thresholds::default(), 12.0);
        app.tick(Duration::ZERO);
        app.card_area = Rect::new(10, 0, 40, 20);
        (app, service)
    }

    async fn settle(app: &mut App) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        app.tick(Duration::ZERO);
    }

    #[tokio::test]
    async fn controller_binds_to_top_card() {
        let (app, _) = app_with(&[1, 2]).await;
        assert_eq!(app.card().unwrap().article_id(), &ArticleId::Num(2));
    }

    #[tokio::test]
    async fn keyboard_swipe_commits_after_exit_animation() {
        let (mut app, service) = app_with(&[1, 2]).await;

        app.swipe(Decision::Like);
        app.tick(Duration::from_millis(100));
        assert_eq!(app.engine.store().len(), 2, "still animating");

        app.tick(EXIT_DURATION);
        assert_eq!(app.engine.store().len(), 1);
        assert_eq!(app.card().unwrap().article_id(), &ArticleId::Num(1));
        assert!(app.status.starts_with("Liked"));

        settle(&mut app).await;
        assert_eq!(service.recorded_swipes(), vec![(ArticleId::Num(2), true)]);
    }

    #[tokio::test]
    async fn mouse_drag_left_rejects() {
        let (mut app, service) = app_with(&[1]).await;
        let t0 = Instant::now();

        app.pointer_down(30, 5, t0);
        app.pointer_drag(25, t0 + Duration::from_millis(500));
        app.pointer_drag(18, t0 + Duration::from_millis(1000)); // -144 units
        app.pointer_up(t0 + Duration::from_millis(1300));

        app.tick(EXIT_DURATION);
        assert!(app.engine.store().is_empty());
        settle(&mut app).await;
        assert_eq!(service.recorded_swipes(), vec![(ArticleId::Num(1), false)]);
    }

    #[tokio::test]
    async fn short_mouse_drag_springs_back() {
        let (mut app, _) = app_with(&[1]).await;
        let t0 = Instant::now();

        app.pointer_down(30, 5, t0);
        app.pointer_drag(33, t0 + Duration::from_millis(500));
        app.pointer_up(t0 + Duration::from_millis(800));

        assert!(matches!(app.card().unwrap().phase(), CardPhase::Springback { .. }));
        app.tick(Duration::from_secs(1));
        assert!(matches!(app.card().unwrap().phase(), CardPhase::Idle));
        assert_eq!(app.engine.store().len(), 1);
    }

    #[tokio::test]
    async fn pointer_outside_card_is_ignored() {
        let (mut app, _) = app_with(&[1]).await;
        app.pointer_down(0, 0, Instant::now());
        assert!(matches!(app.card().unwrap().phase(), CardPhase::Idle));
    }

    #[tokio::test]
    async fn swipes_are_blocked_while_reset_dialog_is_open() {
        let (mut app, _) = app_with(&[1]).await;
        app.request_reset();
        app.swipe(Decision::Like);
        assert!(matches!(app.card().unwrap().phase(), CardPhase::Idle));

        app.cancel_reset();
        assert!(!app.confirm_reset);
    }

    #[tokio::test]
    async fn confirmed_reset_calls_backend() {
        let (mut app, service) = app_with(&[1]).await;
        app.request_reset();
        app.confirm_reset();
        assert!(!app.confirm_reset);
        settle(&mut app).await;
        assert_eq!(service.resets(), 1);
    }

    #[tokio::test]
    async fn swipes_are_ignored_while_reset_reloads() {
        let (mut app, service) = app_with(&[1, 2]).await;
        app.request_reset();
        app.confirm_reset();
        assert!(app.engine.is_loading());

        app.swipe(Decision::Like);
        app.pointer_down(30, 5, Instant::now());
        app.tick(EXIT_DURATION);

        assert!(matches!(app.card().unwrap().phase(), CardPhase::Idle));
        settle(&mut app).await;
        settle(&mut app).await;
        assert!(service.recorded_swipes().is_empty());
    }

    #[tokio::test]
    async fn reset_abandons_exit_in_progress() {
        let (mut app, service) = app_with(&[1, 2]).await;
        app.swipe(Decision::Reject);
        app.tick(Duration::from_millis(100));
        assert!(matches!(app.card().unwrap().phase(), CardPhase::Exiting { .. }));

        app.request_reset();
        app.confirm_reset();
        assert!(matches!(app.card().unwrap().phase(), CardPhase::Idle));

        app.tick(EXIT_DURATION);
        settle(&mut app).await;
        assert!(service.recorded_swipes().is_empty());
    }

    #[tokio::test]
    async fn logout_quits() {
        let (mut app, _) = app_with(&[1]).await;
        app.logout();
        assert!(app.quit);
        assert!(!app.engine.session_active());
    }
}
