//! Database models for content items.

use crate::api::models::contents::ContentKind;
use crate::types::{ContentId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new content item
#[derive(Debug, Clone)]
pub struct ContentCreateDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub kind: ContentKind,
    pub file_url: String,
    /// Duration in seconds, 0 when unknown
    pub duration: i64,
    pub tags: Vec<String>,
    /// The creator. Set once at creation and never reassigned.
    pub instructor_id: UserId,
}

/// Database response for a content item
#[derive(Debug, Clone)]
pub struct ContentDBResponse {
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    pub kind: ContentKind,
    pub file_url: String,
    pub duration: i64,
    pub tags: Vec<String>,
    pub instructor_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
