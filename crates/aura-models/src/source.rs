//! Followed sources and topic preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::UserId;

/// Kind of followed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Youtube,
    X,
    Linkedin,
    News,
    Podcast,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Youtube => "youtube",
            SourceType::X => "x",
            SourceType::Linkedin => "linkedin",
            SourceType::News => "news",
            SourceType::Podcast => "podcast",
        }
    }

    /// Whether the latest item is read from an RSS/Atom feed.
    pub fn is_feed(&self) -> bool {
        matches!(self, SourceType::News | SourceType::Podcast)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A content source followed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: SourceType,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A general topic of interest (not URL-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPreference {
    pub user_id: UserId,
    pub topic: String,
}

/// Latest post / video / article of a source or topic search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestItem {
    pub url: String,
    pub title: Option<String>,
    pub published_at: Option<String>,
}

impl LatestItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            published_at: None,
        }
    }
}
