//! Feed Service abstraction layer.
//!
//! This module defines the [`FeedService`] trait, the [`Article`] value type
//! and the [`Stats`] snapshot.  The concrete backend client lives in
//! [`http`]; tests use the in-memory [`mock`] service.
//!
//! ## For contributors: adding a backend
//!
//! 1. Create a new file in this directory (e.g. `grpc.rs`).
//! 2. Implement [`FeedService`] for your client struct.
//! 3. Re-export it below and construct it in `main.rs`.
//!
//! The engine, coordinator and UI only ever see `Arc<dyn FeedService>`.

mod article;
mod http;

#[cfg(test)]
pub mod mock;

pub use article::{Article, ArticleId};
pub use http::HttpFeedService;

#[cfg(test)]
pub use article::tests::make_article;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Aggregate swipe statistics for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of swipes recorded server-side.
    #[serde(rename = "totalSwipes", alias = "totalCount", default)]
    pub total_count: u64,

    /// Most-liked sources, best first.
    #[serde(rename = "topTopics", alias = "topCategories", default)]
    pub top_categories: Vec<String>,
}

/// The backend the feed client talks to.
///
/// Every method is a single network round trip.  Callers decide what a
/// failure means; implementations only classify it (see
/// [`FeedError`](crate::error::FeedError)).
#[async_trait]
pub trait FeedService: Send + Sync {
    /// Next batch of unseen articles.  An empty batch means the feed is
    /// exhausted for now.
    async fn fetch_feed(&self) -> Result<Vec<Article>>;

    /// Persist one swipe decision.
    async fn record_swipe(&self, article_id: &ArticleId, liked: bool) -> Result<()>;

    /// Destroy the user's swipe history server-side.
    async fn reset_history(&self) -> Result<()>;

    async fn fetch_stats(&self) -> Result<Stats>;

    async fn fetch_liked_items(&self) -> Result<Vec<Article>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_decode_backend_field_names() {
        let stats: Stats =
            serde_json::from_str(r#"{"totalSwipes": 12, "topTopics": ["BBC", "NPR"]}"#).unwrap();
        assert_eq!(stats.total_count, 12);
        assert_eq!(stats.top_categories, vec!["BBC", "NPR"]);
    }

    #[test]
    fn stats_accept_alternate_field_names() {
        let stats: Stats =
            serde_json::from_str(r#"{"totalCount": 3, "topCategories": []}"#).unwrap();
        assert_eq!(stats.total_count, 3);
        assert!(stats.top_categories.is_empty());
    }

    #[test]
    fn stats_missing_fields_default() {
        let stats: Stats = serde_json::from_str("{}").unwrap();
        assert_eq!(stats, Stats::default());
    }
}
