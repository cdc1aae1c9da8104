//! Completion events from background network calls.
//!
//! Every Feed Service call runs as its own tokio task and reports back by
//! sending a [`CoreEvent`] over an unbounded channel.  The engine is the
//! single receiver and applies events one at a time, so the stack, the fetch
//! state and the derived views each keep exactly one writer.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::coordinator::FetchKind;
use crate::error::Result;
use crate::source::{Article, ArticleId, Stats};

#[derive(Debug)]
pub enum CoreEvent {
    /// A replace or append fetch settled.
    FeedLoaded {
        kind: FetchKind,
        result: Result<Vec<Article>>,
    },
    /// The refill debounce timer with this generation fired.
    RefillDue { generation: u64 },
    ResetFinished(Result<()>),
    SwipeRecorded {
        article_id: ArticleId,
        result: Result<()>,
    },
    /// `token` is the swipe counter value the request was made for.
    StatsLoaded { token: u64, result: Result<Stats> },
    LikedLoaded {
        token: u64,
        result: Result<Vec<Article>>,
    },
}

pub type EventSender = mpsc::UnboundedSender<CoreEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<CoreEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Run `call` on the runtime and deliver its event.
///
/// If the receiver is gone the engine has shut down; the event is dropped.
pub fn dispatch<F>(events: &EventSender, call: F) -> JoinHandle<()>
where
    F: Future<Output = CoreEvent> + Send + 'static,
{
    let events = events.clone();
    tokio::spawn(async move {
        let event = call.await;
        let _ = events.send(event);
    })
}
