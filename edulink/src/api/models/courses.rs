//! API request/response models for courses.

use crate::db::models::courses::CourseDBResponse;
use crate::types::{ContentId, CourseId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Course creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseCreate {
    pub title: String,
    pub description: String,
}

/// Course update request. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Course response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub title: String,
    pub description: String,
    /// The creator. Immutable for the lifetime of the course.
    #[schema(value_type = String, format = "uuid")]
    pub instructor_id: UserId,
    #[schema(value_type = Vec<String>)]
    pub content_ids: Vec<ContentId>,
    #[schema(value_type = Vec<String>)]
    pub student_ids: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourseDBResponse> for CourseResponse {
    fn from(db: CourseDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            instructor_id: db.instructor_id,
            content_ids: db.content_ids,
            student_ids: db.student_ids,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Result of attaching content to a course
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachContentResponse {
    pub course: CourseResponse,
    #[schema(value_type = String, format = "uuid")]
    pub added_content_id: ContentId,
}
