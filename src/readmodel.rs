//! Derived read models: swipe stats and the liked-articles list.
//!
//! Both are cached snapshots of backend state that go stale whenever the
//! user swipes or resets.  Staleness is tracked with a [`SwipeCounter`]: a
//! view refetches whenever the counter moves past the value its last request
//! was made for.  Refreshes are stale-while-revalidate; the previous
//! snapshot stays on screen until the new one arrives, and only the very
//! first fetch shows a loading state.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::error::Result;
use crate::source::{Article, Stats};

/// Monotonic invalidation token.  Bumped once per dispatched swipe and once
/// per successful reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SwipeCounter(u64);

impl SwipeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// A cached backend snapshot keyed to the swipe counter.
#[derive(Debug)]
pub struct DerivedView<T> {
    name: &'static str,
    value: T,
    loading: bool,
    /// Counter value of the most recent request.
    requested: Option<u64>,
    /// Counter value of the snapshot currently held.
    applied: Option<u64>,
    updated_at: Option<DateTime<Local>>,
}

pub type StatsView = DerivedView<Stats>;
pub type LikedItemsView = DerivedView<Vec<Article>>;

impl<T: Default> DerivedView<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: T::default(),
            loading: true,
            requested: None,
            applied: None,
            updated_at: None,
        }
    }
}

impl<T> DerivedView<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    /// True only until the first fetch after mount settles.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    /// Whether the view has not yet been requested at `counter`.
    fn is_stale(&self, counter: SwipeCounter) -> bool {
        self.requested != Some(counter.value())
    }

    /// Claim a refresh for `counter`.  Returns the token to tag the request
    /// with, or `None` if one was already issued for this counter value.
    pub fn begin_refresh(&mut self, counter: SwipeCounter) -> Option<u64> {
        if !self.is_stale(counter) {
            return None;
        }
        self.requested = Some(counter.value());
        debug!(view = self.name, token = counter.value(), "refreshing");
        Some(counter.value())
    }

    /// Apply a settled refresh.
    ///
    /// A response older than the snapshot already held is discarded.  A
    /// failure keeps the previous snapshot and is handed back to the caller.
    pub fn apply(&mut self, token: u64, result: Result<T>) -> Result<()> {
        self.loading = false;
        match result {
            Ok(value) => {
                if self.applied.is_some_and(|held| token < held) {
                    debug!(view = self.name, token, "discarding out-of-order response");
                    return Ok(());
                }
                self.value = value;
                self.applied = Some(token);
                self.updated_at = Some(Local::now());
                Ok(())
            }
            Err(err) => {
                warn!(view = self.name, token, error = %err, "refresh failed; keeping previous snapshot");
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
