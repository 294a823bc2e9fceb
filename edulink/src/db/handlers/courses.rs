//! Database repository for courses, including their content attachments and
//! student enrollments.

use crate::types::{ContentId, CourseId, UserId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::courses::{CourseCreateDBRequest, CourseDBResponse, CourseUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing courses
#[derive(Debug, Clone)]
pub struct CourseFilter {
    pub skip: i64,
    pub limit: i64,
}

impl CourseFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Courses<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Courses<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    async fn load_links(&mut self, course: Course) -> Result<CourseDBResponse> {
        let content_ids: Vec<ContentId> =
            sqlx::query_scalar("SELECT content_id FROM course_contents WHERE course_id = ?")
                .bind(course.id)
                .fetch_all(&mut *self.db)
                .await?;

        let student_ids: Vec<UserId> =
            sqlx::query_scalar("SELECT user_id FROM course_enrollments WHERE course_id = ?")
                .bind(course.id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(CourseDBResponse {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor_id: course.instructor_id,
            content_ids,
            student_ids,
            created_at: course.created_at,
            updated_at: course.updated_at,
        })
    }

    #[instrument(skip(self, request), fields(course_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: CourseId, request: &CourseUpdateDBRequest) -> Result<CourseDBResponse> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(request.title.as_deref())
        .bind(request.description.as_deref())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        self.load_links(course).await
    }

    /// Enroll a student. Returns false when the student is already enrolled.
    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&course_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn enroll_student(&mut self, course_id: CourseId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO course_enrollments (course_id, user_id, enrolled_at) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(course_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Attach a content item. Returns false when it is already attached.
    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&course_id), content_id = %abbrev_uuid(&content_id)), err)]
    pub async fn attach_content(&mut self, course_id: CourseId, content_id: ContentId) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO course_contents (course_id, content_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(course_id)
        .bind(content_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Courses<'c> {
    type CreateRequest = CourseCreateDBRequest;
    type Response = CourseDBResponse;
    type Id = CourseId;
    type Filter = CourseFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let course_id = Uuid::new_v4();
        let now = Utc::now();

        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, title, description, instructor_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.instructor_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        self.load_links(course).await
    }

    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match course {
            Some(course) => Ok(Some(self.load_links(course).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        let mut result = Vec::new();
        for course in courses {
            result.push(self.load_links(course).await?);
        }
        Ok(result)
    }

    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_pool, insert_test_user};

    #[tokio::test]
    async fn test_course_crud() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let instructor = insert_test_user(&mut conn, Role::Instructor).await;

        let mut repo = Courses::new(&mut conn);
        let created = repo
            .create(&CourseCreateDBRequest {
                title: "Rust 101".to_string(),
                description: "Ownership and borrowing".to_string(),
                instructor_id: instructor.id,
            })
            .await
            .unwrap();
        assert_eq!(created.title, "Rust 101");
        assert_eq!(created.instructor_id, instructor.id);
        assert!(created.content_ids.is_empty());

        let updated = repo
            .update(
                created.id,
                &CourseUpdateDBRequest {
                    title: Some("Rust 102".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Rust 102");
        assert_eq!(updated.description, "Ownership and borrowing");

        let listed = repo.list(&CourseFilter::new(0, 10)).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        // Deleting again reports nothing removed
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_course() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);

        let err = repo
            .update(Uuid::new_v4(), &CourseUpdateDBRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_enrollment_is_idempotent_flagged() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let instructor = insert_test_user(&mut conn, Role::Instructor).await;
        let student = insert_test_user(&mut conn, Role::Student).await;

        let mut repo = Courses::new(&mut conn);
        let course = repo
            .create(&CourseCreateDBRequest {
                title: "Databases".to_string(),
                description: "Bring your own indexes".to_string(),
                instructor_id: instructor.id,
            })
            .await
            .unwrap();

        assert!(repo.enroll_student(course.id, student.id).await.unwrap());
        // Second enrollment is reported as a duplicate
        assert!(!repo.enroll_student(course.id, student.id).await.unwrap());

        let fetched = repo.get_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(fetched.student_ids, vec![student.id]);
    }
}
