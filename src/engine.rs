//! The feed engine: single owner of all client-side feed state.
//!
//! ```text
//!  commit_swipe ──► FeedStore.pop_top ──► FetchCoordinator.check_drain
//!       │                                        │ (debounce)
//!       └──► record_swipe                        ▼
//!               │ settles                    load_more ──► FeedStore.append
//!               └──► SwipeCounter.bump ──► views
//! ```
//!
//! Network calls run as tokio tasks and report back as [`CoreEvent`]s; the
//! engine applies them one at a time from [`FeedEngine::pump`] (or
//! [`FeedEngine::process_next`] in tests).  Swipe persistence is optimistic:
//! the stack moves immediately and a failed `record_swipe` is only logged.
//! The counter waits for `record_swipe` to settle so the views never
//! snapshot the backend before it has seen the swipe.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::card::SwipeCommit;
use crate::coordinator::FetchCoordinator;
use crate::error::FeedError;
use crate::events::{channel, dispatch, CoreEvent, EventReceiver, EventSender};
use crate::readmodel::{LikedItemsView, StatsView, SwipeCounter};
use crate::session::Session;
use crate::source::{Article, FeedService};
use crate::store::FeedStore;

pub struct FeedEngine {
    service: Arc<dyn FeedService>,
    session: Arc<dyn Session>,
    events: EventSender,
    inbox: EventReceiver,

    store: FeedStore,
    coordinator: FetchCoordinator,
    counter: SwipeCounter,
    stats: StatsView,
    liked: LikedItemsView,
}

impl FeedEngine {
    pub fn new(
        service: Arc<dyn FeedService>,
        session: Arc<dyn Session>,
        refill_debounce: Duration,
    ) -> Self {
        let (events, inbox) = channel();
        let coordinator = FetchCoordinator::new(service.clone(), events.clone(), refill_debounce);
        Self {
            service,
            session,
            events,
            inbox,
            store: FeedStore::new(),
            coordinator,
            counter: SwipeCounter::new(),
            stats: StatsView::new("stats"),
            liked: LikedItemsView::new("liked"),
        }
    }

    /// Kick off the initial feed load and the first view fetches.
    pub fn start(&mut self) {
        self.coordinator.load_initial();
        self.refresh_views();
    }

    // -- read access ---------------------------------------------------------

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn stats(&self) -> &StatsView {
        &self.stats
    }

    pub fn liked(&self) -> &LikedItemsView {
        &self.liked
    }

    pub fn counter(&self) -> SwipeCounter {
        self.counter
    }

    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading(&self.store)
    }

    pub fn is_exhausted(&self) -> bool {
        self.coordinator.is_exhausted(&self.store)
    }

    pub fn session_active(&self) -> bool {
        self.session.is_active()
    }

    // -- user actions --------------------------------------------------------

    /// Apply a finished card exit.
    ///
    /// Pops the top card, dispatches `record_swipe` without waiting for it
    /// and re-checks the drain condition.  The swipe counter is bumped when
    /// `record_swipe` settles, whatever its outcome.  A commit
    /// for a card that is no longer on top (the stack was replaced during
    /// the exit animation) is dropped.
    pub fn commit_swipe(&mut self, commit: SwipeCommit) -> Option<Article> {
        if self.store.top().map(|a| &a.id) != Some(&commit.article_id) {
            warn!(article = %commit.article_id, "commit for a card that is not on top; ignoring");
            return None;
        }
        let article = match self.store.pop_top() {
            Ok(article) => article,
            Err(err) => {
                warn!(error = %err, "commit on empty stack");
                return None;
            }
        };

        let liked = commit.decision.liked();
        info!(article = %article.id, liked, remaining = self.store.len(), "swiped");

        let service = self.service.clone();
        let article_id = article.id.clone();
        dispatch(&self.events, async move {
            let result = service.record_swipe(&article_id, liked).await;
            CoreEvent::SwipeRecorded { article_id, result }
        });

        self.coordinator.check_drain(&self.store);
        Some(article)
    }

    /// Clear swipe history and reload.  Returns `false` if a reset is
    /// already running.
    pub fn reset(&mut self) -> bool {
        self.coordinator.reset()
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    // -- event handling ------------------------------------------------------

    /// Apply every event that has already arrived.  Returns how many were
    /// handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.inbox.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event and apply it.  Returns `false` once the
    /// channel is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.inbox.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    pub fn handle(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::FeedLoaded { kind, result } => {
                if let Err(err) = self.coordinator.on_feed_loaded(kind, result, &mut self.store) {
                    self.note_failure(&err);
                }
            }
            CoreEvent::RefillDue { generation } => {
                self.coordinator.on_refill_due(generation, &self.store);
            }
            CoreEvent::ResetFinished(result) => {
                match self.coordinator.on_reset_finished(result, &self.store) {
                    Ok(()) => {
                        self.counter.bump();
                        self.refresh_views();
                    }
                    Err(err) => self.note_failure(&err),
                }
            }
            CoreEvent::SwipeRecorded { article_id, result } => {
                match result {
                    Ok(()) => debug!(article = %article_id, "swipe recorded"),
                    Err(err) => {
                        warn!(article = %article_id, error = %err, "failed to record swipe");
                        self.note_failure(&err);
                    }
                }
                // Views refetch only once the backend has seen the swipe.
                self.counter.bump();
                self.refresh_views();
            }
            CoreEvent::StatsLoaded { token, result } => {
                if let Err(err) = self.stats.apply(token, result) {
                    self.note_failure(&err);
                }
            }
            CoreEvent::LikedLoaded { token, result } => {
                if let Err(err) = self.liked.apply(token, result) {
                    self.note_failure(&err);
                }
            }
        }
    }

    /// Refetch every derived view that has not yet been requested at the
    /// current counter value.
    fn refresh_views(&mut self) {
        if let Some(token) = self.stats.begin_refresh(self.counter) {
            let service = self.service.clone();
            dispatch(&self.events, async move {
                CoreEvent::StatsLoaded {
                    token,
                    result: service.fetch_stats().await,
                }
            });
        }
        if let Some(token) = self.liked.begin_refresh(self.counter) {
            let service = self.service.clone();
            dispatch(&self.events, async move {
                CoreEvent::LikedLoaded {
                    token,
                    result: service.fetch_liked_items().await,
                }
            });
        }
    }

    /// A rejected credential ends the session; everything else has already
    /// been logged where it happened.
    fn note_failure(&self, err: &FeedError) {
        if err.is_unauthenticated() && self.session.is_active() {
            warn!("backend rejected the session credential; logging out");
            self.session.logout();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::coordinator::DEFAULT_REFILL_DEBOUNCE;
    use crate::gesture::Decision;
    use crate::session::TokenSession;
    use crate::source::mock::MockFeedService;
    use crate::source::{make_article, ArticleId, Stats};

    fn engine_with(service: Arc<MockFeedService>) -> (FeedEngine, Arc<TokenSession>) {
        let session = Arc::new(TokenSession::new("token"));
        let engine = FeedEngine::new(service, session.clone(), DEFAULT_REFILL_DEBOUNCE);
        (engine, session)
    }

    /// Start the engine with `ids` and settle the three startup calls.
    async fn booted(service: &Arc<MockFeedService>, ids: &[i64]) -> FeedEngine {
        service.push_feed(Ok(ids.iter().map(|&id| make_article(id, "t")).collect()));
        let (mut engine, _) = engine_with(service.clone());
        engine.start();
        for _ in 0..3 {
            assert!(engine.process_next().await);
        }
        engine
    }

    fn commit(id: i64, decision: Decision) -> SwipeCommit {
        SwipeCommit {
            article_id: ArticleId::Num(id),
            decision,
        }
    }

    /// Let spawned tasks run and apply whatever they produced.
    async fn settle(engine: &mut FeedEngine) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        engine.pump();
    }

    #[tokio::test]
    async fn start_loads_feed_and_both_views() {
        let service = MockFeedService::new();
        service.push_stats(Ok(Stats {
            total_count: 2,
            top_categories: vec!["NPR".into()],
        }));
        let engine = booted(&service, &[1, 2]).await;

        assert_eq!(engine.store().len(), 2);
        assert!(!engine.is_loading());
        assert!(!engine.stats().is_loading());
        assert!(!engine.liked().is_loading());
        assert_eq!(engine.stats().value().total_count, 2);
    }

    #[tokio::test]
    async fn like_commit_pops_records_and_bumps_counter_once() {
        let service = MockFeedService::new();
        let mut engine = booted(&service, &[1, 2]).await;
        let before = engine.counter().value();

        let popped = engine.commit_swipe(commit(2, Decision::Like)).unwrap();
        assert_eq!(popped.id, ArticleId::Num(2));

        settle(&mut engine).await;
        assert_eq!(engine.counter().value(), before + 1);
        assert_eq!(service.recorded_swipes(), vec![(ArticleId::Num(2), true)]);
        assert_eq!(engine.store().top().unwrap().id, ArticleId::Num(1));
    }

    #[tokio::test]
    async fn commit_refreshes_both_views() {
        let service = MockFeedService::new();
        let mut engine = booted(&service, &[1]).await;
        let stats_before = service.stats_calls.load(Ordering::SeqCst);
        let liked_before = service.liked_calls.load(Ordering::SeqCst);

        engine.commit_swipe(commit(1, Decision::Reject));
        settle(&mut engine).await;
        settle(&mut engine).await;

        assert_eq!(service.stats_calls.load(Ordering::SeqCst), stats_before + 1);
        assert_eq!(service.liked_calls.load(Ordering::SeqCst), liked_before + 1);
        assert!(!engine.stats().is_loading(), "revalidation never shows loading");
    }

    #[tokio::test]
    async fn views_refetch_only_after_swipe_is_persisted() {
        let service = MockFeedService::new();
        let mut engine = booted(&service, &[1, 2]).await;
        let gate = service.gate_swipes();
        let stats_before = service.stats_calls.load(Ordering::SeqCst);
        let liked_before = service.liked_calls.load(Ordering::SeqCst);
        service.push_stats(Ok(Stats {
            total_count: 1,
            top_categories: vec!["BBC".into()],
        }));
        service.push_liked(Ok(vec![make_article(2, "liked")]));

        engine.commit_swipe(commit(2, Decision::Like));
        assert_eq!(engine.store().len(), 1, "pop does not wait for persistence");
        settle(&mut engine).await;

        assert_eq!(engine.counter().value(), 0);
        assert_eq!(service.stats_calls.load(Ordering::SeqCst), stats_before);
        assert_eq!(service.liked_calls.load(Ordering::SeqCst), liked_before);

        gate.add_permits(1);
        settle(&mut engine).await;
        settle(&mut engine).await;

        assert_eq!(engine.counter().value(), 1);
        assert_eq!(engine.stats().value().total_count, 1);
        let liked: Vec<_> = engine.liked().value().iter().map(|a| a.id.clone()).collect();
        assert_eq!(liked, vec![ArticleId::Num(2)]);
    }

    #[tokio::test]
    async fn failed_swipe_persistence_is_not_rolled_back() {
        let service = MockFeedService::new();
        service.fail_swipes_with(FeedError::Network("down".into()));
        let mut engine = booted(&service, &[1, 2]).await;

        engine.commit_swipe(commit(2, Decision::Reject));
        settle(&mut engine).await;

        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.counter().value(), 1);
        assert_eq!(service.recorded_swipes(), vec![(ArticleId::Num(2), false)]);
    }

    #[tokio::test]
    async fn commit_for_card_not_on_top_is_ignored() {
        let service = MockFeedService::new();
        let mut engine = booted(&service, &[1, 2]).await;

        assert!(engine.commit_swipe(commit(1, Decision::Like)).is_none());
        assert_eq!(engine.store().len(), 2);
        assert_eq!(engine.counter().value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn swiping_last_card_triggers_refill() {
        let service = MockFeedService::new();
        let mut engine = booted(&service, &[1]).await;
        service.push_feed(Ok(vec![make_article(10, "next"), make_article(11, "next")]));

        engine.commit_swipe(commit(1, Decision::Like));
        assert!(engine.store().is_empty());
        assert!(engine.is_loading(), "spinner while the refill is pending");

        while engine.store().is_empty() {
            assert!(engine.process_next().await);
        }
        assert_eq!(engine.store().top().unwrap().id, ArticleId::Num(11));
        assert_eq!(service.fetches(), 2);
    }

    #[tokio::test]
    async fn reset_bumps_counter_and_replaces_stack() {
        let service = MockFeedService::new();
        let mut engine = booted(&service, &[1, 2]).await;
        service.push_feed(Ok(vec![make_article(20, "fresh")]));
        let before = engine.counter().value();
        let stats_before = service.stats_calls.load(Ordering::SeqCst);
        let liked_before = service.liked_calls.load(Ordering::SeqCst);

        assert!(engine.reset());
        while engine.coordinator().is_resetting() || engine.coordinator().is_fetching() {
            assert!(engine.process_next().await);
        }
        settle(&mut engine).await;

        assert!(engine.counter().value() > before);
        let ids: Vec<_> = engine.store().iter_top_first().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![ArticleId::Num(20)]);
        assert!(service.stats_calls.load(Ordering::SeqCst) > stats_before);
        assert!(service.liked_calls.load(Ordering::SeqCst) > liked_before);
    }

    #[tokio::test]
    async fn unauthenticated_response_logs_out() {
        let service = MockFeedService::new();
        service.push_feed(Err(FeedError::Unauthenticated));
        let (mut engine, session) = engine_with(service.clone());

        engine.start();
        for _ in 0..3 {
            engine.process_next().await;
        }

        assert!(!session.is_active());
        assert!(!engine.session_active());
    }

    #[tokio::test]
    async fn generic_failure_keeps_session() {
        let service = MockFeedService::new();
        service.push_stats(Err(FeedError::Network("down".into())));
        let (mut engine, session) = engine_with(service.clone());

        engine.start();
        for _ in 0..3 {
            engine.process_next().await;
        }

        assert!(session.is_active());
        assert!(!engine.stats().is_loading());
    }
}
