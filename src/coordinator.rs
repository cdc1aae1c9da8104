//! Single-flight refill policy for the card stack.
//!
//! [`FetchCoordinator`] decides when the stack is (re)loaded:
//!
//! * **replace** loads (startup, after a reset) swap the whole stack;
//! * **append** loads slide a new batch underneath the remaining cards.
//!
//! At most one of them is in flight at a time.  A `load_more` that arrives
//! while a fetch is running is dropped, not queued.  When the stack runs dry
//! the coordinator arms a short debounce timer; a newer drain re-arms it, so
//! only the latest pending refill ever fires.  Timers are tagged with a
//! generation number and aborted on re-arm and on drop, and a stale firing
//! that was already in the channel is ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{dispatch, CoreEvent, EventSender};
use crate::source::{Article, FeedService};
use crate::store::FeedStore;

pub const DEFAULT_REFILL_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Replace,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching(FetchKind),
}

pub struct FetchCoordinator {
    service: Arc<dyn FeedService>,
    events: EventSender,
    state: FetchState,
    debounce: Duration,

    /// The first load has settled (successfully or not).  Drain refills are
    /// suppressed until then.
    initial_settled: bool,
    /// At least one fetch succeeded.
    has_loaded: bool,
    /// The last successful fetch returned nothing.
    exhausted: bool,
    /// A reset is waiting on the backend.
    resetting: bool,
    /// A reset finished while a fetch was in flight; run the replace load as
    /// soon as that fetch settles.
    pending_replace: bool,

    refill_timer: Option<JoinHandle<()>>,
    refill_generation: u64,
}

impl FetchCoordinator {
    pub fn new(service: Arc<dyn FeedService>, events: EventSender, debounce: Duration) -> Self {
        Self {
            service,
            events,
            state: FetchState::Idle,
            debounce,
            initial_settled: false,
            has_loaded: false,
            exhausted: false,
            resetting: false,
            pending_replace: false,
            refill_timer: None,
            refill_generation: 0,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, FetchState::Fetching(_))
    }

    pub fn is_resetting(&self) -> bool {
        self.resetting
    }

    pub fn refill_pending(&self) -> bool {
        self.refill_timer.is_some()
    }

    /// Whether the UI should show a spinner instead of the stack.
    ///
    /// True until something has loaded, during resets and replace loads,
    /// and while an empty stack waits on a refill that has not yet been
    /// found to be exhausted.
    pub fn is_loading(&self, store: &FeedStore) -> bool {
        if !self.has_loaded || self.resetting || self.pending_replace {
            return true;
        }
        match self.state {
            FetchState::Fetching(FetchKind::Replace) => true,
            _ if store.is_empty() && !self.exhausted => {
                self.is_fetching() || self.refill_pending()
            }
            _ => false,
        }
    }

    /// The stack is empty because the backend has nothing more to give.
    pub fn is_exhausted(&self, store: &FeedStore) -> bool {
        store.is_empty() && !self.is_loading(store)
    }

    /// Startup load.  Replaces the (empty) stack.
    pub fn load_initial(&mut self) -> bool {
        info!("loading initial feed");
        self.start(FetchKind::Replace)
    }

    /// Fetch another batch to go underneath the current stack.  Returns
    /// `false` if a fetch is already running.
    pub fn load_more(&mut self) -> bool {
        self.start(FetchKind::Append)
    }

    fn start(&mut self, kind: FetchKind) -> bool {
        if let FetchState::Fetching(running) = self.state {
            debug!(?kind, ?running, "fetch already in flight; dropping request");
            return false;
        }
        self.state = FetchState::Fetching(kind);
        let service = self.service.clone();
        dispatch(&self.events, async move {
            CoreEvent::FeedLoaded {
                kind,
                result: service.fetch_feed().await,
            }
        });
        true
    }

    /// Apply a settled fetch.  The stack is only touched on success; on
    /// failure it is left exactly as it was.  The error is handed back so
    /// the caller can act on authentication failures.
    pub fn on_feed_loaded(
        &mut self,
        kind: FetchKind,
        result: Result<Vec<Article>>,
        store: &mut FeedStore,
    ) -> Result<()> {
        self.state = FetchState::Idle;
        self.initial_settled = true;

        let outcome = match result {
            Ok(batch) => {
                let count = batch.len();
                self.has_loaded = true;
                self.exhausted = count == 0;
                match kind {
                    FetchKind::Replace => {
                        info!(count, "feed loaded");
                        store.replace(batch);
                    }
                    FetchKind::Append if count == 0 => info!("feed exhausted"),
                    FetchKind::Append => {
                        info!(count, "appending articles under the stack");
                        store.append(batch);
                    }
                }
                Ok(())
            }
            Err(err) => {
                warn!(?kind, error = %err, "feed fetch failed");
                Err(err)
            }
        };

        if self.pending_replace {
            self.pending_replace = false;
            self.start(FetchKind::Replace);
        } else {
            self.check_drain(store);
        }
        outcome
    }

    /// Re-evaluate the drain condition after any change to the stack or the
    /// fetch state.
    ///
    /// Any pending refill is cancelled first.  A new one is armed only if
    /// the stack is empty, nothing is in flight, the first load has settled
    /// and no reset is running.
    pub fn check_drain(&mut self, store: &FeedStore) {
        self.cancel_refill();
        if !store.is_empty() || self.is_fetching() || !self.initial_settled || self.resetting {
            return;
        }

        self.refill_generation += 1;
        let generation = self.refill_generation;
        let delay = self.debounce;
        debug!(generation, ?delay, "stack drained; scheduling refill");
        self.refill_timer = Some(dispatch(&self.events, async move {
            tokio::time::sleep(delay).await;
            CoreEvent::RefillDue { generation }
        }));
    }

    /// The debounce timer fired.
    pub fn on_refill_due(&mut self, generation: u64, store: &FeedStore) {
        if generation != self.refill_generation || self.refill_timer.is_none() {
            debug!(generation, current = self.refill_generation, "ignoring stale refill");
            return;
        }
        self.refill_timer = None;
        if store.is_empty() {
            self.load_more();
        }
    }

    pub fn cancel_refill(&mut self) {
        if let Some(timer) = self.refill_timer.take() {
            timer.abort();
        }
    }

    /// Clear the swipe history on the backend, then reload from scratch.
    /// Returns `false` if a reset is already running.
    pub fn reset(&mut self) -> bool {
        if self.resetting {
            debug!("reset already in progress");
            return false;
        }
        info!("resetting swipe history");
        self.resetting = true;
        self.cancel_refill();
        let service = self.service.clone();
        dispatch(&self.events, async move {
            CoreEvent::ResetFinished(service.reset_history().await)
        });
        true
    }

    /// Apply the backend's answer to a reset.  On success a replace load
    /// starts (or is queued behind the fetch in flight).
    pub fn on_reset_finished(&mut self, result: Result<()>, store: &FeedStore) -> Result<()> {
        self.resetting = false;
        match result {
            Ok(()) => {
                self.exhausted = false;
                if self.is_fetching() {
                    debug!("fetch in flight; replace load queued behind it");
                    self.pending_replace = true;
                } else {
                    self.start(FetchKind::Replace);
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "reset failed");
                self.check_drain(store);
                Err(err)
            }
        }
    }
}

impl Drop for FetchCoordinator {
    fn drop(&mut self) {
        self.cancel_refill();
    }
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("state", &self.state)
            .field("initial_settled", &self.initial_settled)
            .field("exhausted", &self.exhausted)
            .field("resetting", &self.resetting)
            .field("refill_generation", &self.refill_generation)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
