//! The article value type shared by the stack, the liked list and the UI.
//!
//! Articles are decoded once from the backend and never mutated afterwards;
//! the card stack only moves and drops them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shown when the backend did not supply an image.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/600x400/333/FFF?text=No+Image";

/// Shown when the supplied image link cannot be loaded at all.
pub const IMAGE_UNAVAILABLE_URL: &str =
    "https://placehold.co/600x400/333/FFF?text=Image+Not+Available";

/// Backend article identifier.
///
/// The backend may hand out numeric or string ids.  The original wire form
/// is kept so it can be echoed back verbatim in `record_swipe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleId {
    Num(i64),
    Text(String),
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleId::Num(n) => write!(f, "{n}"),
            ArticleId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ArticleId {
    fn from(n: i64) -> Self {
        ArticleId::Num(n)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        ArticleId::Text(s.to_string())
    }
}

/// A single news article as served by the feed backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Unique and stable for the whole session.
    pub id: ArticleId,

    /// Headline.
    pub title: String,

    /// Summary text.  Missing descriptions decode as an empty string.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// Lead image, if any.  See [`Article::image_or_placeholder`].
    #[serde(default)]
    pub image_url: Option<String>,

    /// Link to the full article.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub article_url: String,

    /// Publisher name (e.g. "BBC News").
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_name: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Article {
    /// The image to display, falling back to [`PLACEHOLDER_IMAGE_URL`] when
    /// the backend sent none and to [`IMAGE_UNAVAILABLE_URL`] when the link
    /// is not an http(s) URL.
    pub fn image_or_placeholder(&self) -> &str {
        match self.image_url.as_deref().map(str::trim) {
            None | Some("") => PLACEHOLDER_IMAGE_URL,
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => url,
            Some(_) => IMAGE_UNAVAILABLE_URL,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
