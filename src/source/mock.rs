//! Scriptable in-memory [`FeedService`] for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{Article, ArticleId, FeedService, Stats};
use crate::error::{FeedError, Result};

#[derive(Default)]
pub struct MockFeedService {
    feeds: Mutex<VecDeque<Result<Vec<Article>>>>,
    stats: Mutex<VecDeque<Result<Stats>>>,
    liked: Mutex<VecDeque<Result<Vec<Article>>>>,
    swipe_error: Mutex<Option<FeedError>>,
    reset_error: Mutex<Option<FeedError>>,
    feed_gate: Mutex<Option<Arc<Semaphore>>>,
    swipe_gate: Mutex<Option<Arc<Semaphore>>>,

    pub fetch_calls: AtomicUsize,
    pub reset_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub liked_calls: AtomicUsize,
    pub swipes: Mutex<Vec<(ArticleId, bool)>>,
}

impl MockFeedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the result of the next `fetch_feed`.  Once the queue is empty
    /// the feed reports itself exhausted.
    pub fn push_feed(&self, result: Result<Vec<Article>>) {
        self.feeds.lock().unwrap().push_back(result);
    }

    pub fn push_stats(&self, result: Result<Stats>) {
        self.stats.lock().unwrap().push_back(result);
    }

    pub fn push_liked(&self, result: Result<Vec<Article>>) {
        self.liked.lock().unwrap().push_back(result);
    }

    pub fn fail_swipes_with(&self, err: FeedError) {
        *self.swipe_error.lock().unwrap() = Some(err);
    }

    pub fn fail_reset_with(&self, err: FeedError) {
        *self.reset_error.lock().unwrap() = Some(err);
    }

    /// Make every `fetch_feed` block until a permit is added to the
    /// returned semaphore.
    pub fn gate_feed(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.feed_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Make every `record_swipe` block until a permit is added to the
    /// returned semaphore.  The swipe is recorded once it gets through.
    pub fn gate_swipes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.swipe_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }

    pub fn recorded_swipes(&self) -> Vec<(ArticleId, bool)> {
        self.swipes.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedService for MockFeedService {
    async fn fetch_feed(&self) -> Result<Vec<Article>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.feed_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.feeds.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn record_swipe(&self, article_id: &ArticleId, liked: bool) -> Result<()> {
        let gate = self.swipe_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.swipes.lock().unwrap().push((article_id.clone(), liked));
        match self.swipe_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn reset_history(&self) -> Result<()> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        match self.reset_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_stats(&self) -> Result<Stats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.stats.lock().unwrap().pop_front().unwrap_or(Ok(Stats::default()))
    }

    async fn fetch_liked_items(&self) -> Result<Vec<Article>> {
        self.liked_calls.fetch_add(1, Ordering::SeqCst);
        self.liked.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }
}
