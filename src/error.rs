//! Error types shared by the feed client.
//!
//! Every Feed Service call returns [`FeedError`].  Almost all of them are
//! caught at the engine boundary and logged; none are fatal to the session.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The backend rejected the session credential.
    #[error("session is not authenticated")]
    Unauthenticated,

    /// `pop_top` was called on an empty stack.
    #[error("card stack is empty")]
    EmptyStack,
}

impl FeedError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, FeedError::Unauthenticated)
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FeedError::Decode(err.to_string())
        } else {
            FeedError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
