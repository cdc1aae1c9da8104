//! HTTP backend client.
//!
//! Talks JSON to the feed backend with [`reqwest`], attaching the session's
//! bearer token to every call.  Status classification is a pure function
//! ([`status_error`]) so it can be tested without a server.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;

use super::{Article, ArticleId, FeedService, Stats};
use crate::error::{FeedError, Result};
use crate::session::Session;

/// A [`FeedService`] backed by the REST API.
pub struct HttpFeedService {
    client: reqwest::Client,
    /// Base URL without trailing slash (e.g. `http://localhost:4000`).
    base_url: String,
    session: Arc<dyn Session>,
}

#[derive(Serialize)]
struct SwipeBody<'a> {
    #[serde(rename = "articleId")]
    article_id: &'a ArticleId,
    liked: bool,
}

impl HttpFeedService {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn Session>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, if the session still has one.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.credential() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }
}

/// Map a non-success status to a [`FeedError`].
///
/// 401 and 403 are reported as [`FeedError::Unauthenticated`] so the engine
/// can end the session instead of retrying.
pub fn status_error(status: StatusCode, body: String) -> FeedError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FeedError::Unauthenticated,
        _ => FeedError::Api {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl FeedService for HttpFeedService {
    async fn fetch_feed(&self) -> Result<Vec<Article>> {
        let resp = self.send(self.client.get(self.url("/api/feed"))).await?;
        Ok(resp.json().await?)
    }

    async fn record_swipe(&self, article_id: &ArticleId, liked: bool) -> Result<()> {
        let body = SwipeBody { article_id, liked };
        self.send(self.client.post(self.url("/api/swipe")).json(&body))
            .await?;
        Ok(())
    }

    async fn reset_history(&self) -> Result<()> {
        self.send(self.client.post(self.url("/api/reset"))).await?;
        Ok(())
    }

    async fn fetch_stats(&self) -> Result<Stats> {
        let resp = self.send(self.client.get(self.url("/api/stats"))).await?;
        Ok(resp.json().await?)
    }

    async fn fetch_liked_items(&self) -> Result<Vec<Article>> {
        let resp = self
            .send(self.client.get(self.url("/api/liked-articles")))
            .await?;
        Ok(resp.json().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
