//! Database models for courses.

use crate::types::{ContentId, CourseId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new course
#[derive(Debug, Clone)]
pub struct CourseCreateDBRequest {
    pub title: String,
    pub description: String,
    /// The creator. Set once at creation and never reassigned.
    pub instructor_id: UserId,
}

/// Database request for updating a course. `None` fields keep their current
/// value.
#[derive(Debug, Clone, Default)]
pub struct CourseUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Database response for a course, including its attached content and
/// enrolled students.
#[derive(Debug, Clone)]
pub struct CourseDBResponse {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor_id: UserId,
    pub content_ids: Vec<ContentId>,
    pub student_ids: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
