//! API request/response models for content items.

use crate::db::models::contents::ContentDBResponse;
use crate::types::{ContentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Content classification. Closed enumeration mirroring what the media
/// pipeline can serve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Document,
    Audio,
    Other,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentKind::Video => "video",
            ContentKind::Document => "document",
            ContentKind::Audio => "audio",
            ContentKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(ContentKind::Video),
            "document" => Ok(ContentKind::Document),
            "audio" => Ok(ContentKind::Audio),
            "other" => Ok(ContentKind::Other),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

/// Sort key for content listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentSortBy {
    #[default]
    CreatedAt,
    Title,
    Duration,
}

impl ContentSortBy {
    /// The column this key sorts on. Fixed strings, never user input.
    pub fn column(&self) -> &'static str {
        match self {
            ContentSortBy::CreatedAt => "created_at",
            ContentSortBy::Title => "title",
            ContentSortBy::Duration => "duration",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query parameters for listing content. Pagination is extracted
/// separately (see [`super::pagination::Pagination`]).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListContentsQuery {
    /// Filter by content kind
    pub kind: Option<ContentKind>,
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    /// Filter by the creator's user ID
    #[param(value_type = String, format = "uuid")]
    pub uploaded_by: Option<UserId>,
    /// Only content created at or after this instant (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Only content created at or before this instant (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    /// Sort key (default: created_at)
    #[serde(default)]
    pub sort_by: ContentSortBy,
    /// Sort direction (default: desc)
    #[serde(default)]
    pub order: SortOrder,
}

/// Content response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    pub kind: ContentKind,
    pub file_url: String,
    /// Duration in seconds, 0 when unknown
    pub duration: i64,
    pub tags: Vec<String>,
    #[schema(value_type = String, format = "uuid")]
    pub uploaded_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContentDBResponse> for ContentResponse {
    fn from(db: ContentDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            kind: db.kind,
            file_url: db.file_url,
            duration: db.duration,
            tags: db.tags,
            uploaded_by: db.instructor_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Pagination metadata returned with content listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListMetadata {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Paginated content listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentListResponse {
    pub metadata: ListMetadata,
    pub content: Vec<ContentResponse>,
}
