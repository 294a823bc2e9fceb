//! Database repository for content items.

use crate::api::models::contents::{ContentKind, ContentSortBy, SortOrder};
use crate::types::{ContentId, UserId, abbrev_uuid};
use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::contents::{ContentCreateDBRequest, ContentDBResponse},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, types::Json};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing content
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub kind: Option<ContentKind>,
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    pub uploaded_by: Option<UserId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub sort_by: ContentSortBy,
    pub order: SortOrder,
    pub skip: i64,
    pub limit: i64,
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Content {
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    pub kind: ContentKind,
    pub file_url: String,
    pub duration: i64,
    pub tags: Json<Vec<String>>,
    pub instructor_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Content> for ContentDBResponse {
    fn from(content: Content) -> Self {
        Self {
            id: content.id,
            title: content.title,
            description: content.description,
            kind: content.kind,
            file_url: content.file_url,
            duration: content.duration,
            tags: content.tags.0,
            instructor_id: content.instructor_id,
            created_at: content.created_at,
            updated_at: content.updated_at,
        }
    }
}

pub struct Contents<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Contents<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ContentFilter) {
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        if let Some(title) = &filter.title {
            builder.push(" AND title LIKE ").push_bind(format!("%{title}%"));
        }
        if let Some(uploaded_by) = filter.uploaded_by {
            builder.push(" AND instructor_id = ").push_bind(uploaded_by);
        }
        if let Some(from) = filter.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND created_at <= ").push_bind(to);
        }
    }

    /// Count the rows matching the filter, ignoring pagination.
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ContentFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM contents WHERE 1=1");
        Self::push_filters(&mut builder, filter);

        let total: i64 = builder.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(total)
    }
}

/// Lowercase and deduplicate tags, preserving first-seen order.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

#[async_trait::async_trait]
impl<'c> Repository for Contents<'c> {
    type CreateRequest = ContentCreateDBRequest;
    type Response = ContentDBResponse;
    type Id = ContentId;
    type Filter = ContentFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let content_id = Uuid::new_v4();
        let now = Utc::now();

        let content = sqlx::query_as::<_, Content>(
            r#"
            INSERT INTO contents (id, title, description, kind, file_url, duration, tags, instructor_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(content_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.kind)
        .bind(&request.file_url)
        .bind(request.duration)
        .bind(Json(normalize_tags(&request.tags)))
        .bind(request.instructor_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ContentDBResponse::from(content))
    }

    #[instrument(skip(self), fields(content_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let content = sqlx::query_as::<_, Content>("SELECT * FROM contents WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(content.map(ContentDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM contents WHERE 1=1");
        Self::push_filters(&mut builder, filter);

        builder
            .push(" ORDER BY ")
            .push(filter.sort_by.column())
            .push(" ")
            .push(filter.order.keyword())
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let contents: Vec<Content> = builder.build_query_as().fetch_all(&mut *self.db).await?;
        Ok(contents.into_iter().map(ContentDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(content_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contents WHERE id = ?")
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

    fn content_request(title: &str, kind: ContentKind, instructor_id: UserId) -> ContentCreateDBRequest {
        ContentCreateDBRequest {
            title: title.to_string(),
            description: Some("description".to_string()),
            kind,
            file_url: format!("https://media.example.com/{title}"),
            duration: 90,
            tags: vec![],
            instructor_id,
        }
    }

    #[tokio::test]
    async fn test_content_crud() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let instructor = insert_test_user(&mut conn, Role::Instructor).await;

        let mut repo = Contents::new(&mut conn);
        let created = repo
            .create(&content_request("intro.mp4", ContentKind::Video, instructor.id))
            .await
            .unwrap();
        assert_eq!(created.kind, ContentKind::Video);
        assert_eq!(created.duration, 90);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tags_are_normalized() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let instructor = insert_test_user(&mut conn, Role::Instructor).await;

        let mut repo = Contents::new(&mut conn);
        let mut request = content_request("notes.pdf", ContentKind::Document, instructor.id);
        request.tags = vec![
            "Rust".to_string(),
            "rust".to_string(),
            " Async ".to_string(),
            "".to_string(),
        ];

        let created = repo.create(&request).await.unwrap();
        assert_eq!(created.tags, vec!["rust".to_string(), "async".to_string()]);
    }

    #[tokio::test]
    async fn test_list_filters_and_sorting() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let alice = insert_test_user(&mut conn, Role::Instructor).await;
        let bob = insert_test_user(&mut conn, Role::Instructor).await;

        let mut repo = Contents::new(&mut conn);
        repo.create(&content_request("a-video.mp4", ContentKind::Video, alice.id))
            .await
            .unwrap();
        repo.create(&content_request("b-video.mp4", ContentKind::Video, bob.id))
            .await
            .unwrap();
        repo.create(&content_request("notes.pdf", ContentKind::Document, alice.id))
            .await
            .unwrap();

        // Filter by kind
        let filter = ContentFilter {
            kind: Some(ContentKind::Video),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        // Filter by uploader
        let filter = ContentFilter {
            uploaded_by: Some(alice.id),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        // Title substring, case-insensitive for ASCII
        let filter = ContentFilter {
            title: Some("VIDEO".to_string()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        // Sort by title ascending
        let filter = ContentFilter {
            sort_by: ContentSortBy::Title,
            order: SortOrder::Asc,
            limit: 10,
            ..Default::default()
        };
        let listed = repo.list(&filter).await.unwrap();
        assert_eq!(listed[0].title, "a-video.mp4");

        // Pagination
        let filter = ContentFilter {
            sort_by: ContentSortBy::Title,
            order: SortOrder::Asc,
            skip: 2,
            limit: 2,
            ..Default::default()
        };
        let listed = repo.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "notes.pdf");
    }

    #[tokio::test]
    async fn test_date_range_filter() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let instructor = insert_test_user(&mut conn, Role::Instructor).await;

        let mut repo = Contents::new(&mut conn);
        let created = repo
            .create(&content_request("clip.mp4", ContentKind::Video, instructor.id))
            .await
            .unwrap();

        let filter = ContentFilter {
            from: Some(created.created_at - chrono::Duration::minutes(1)),
            to: Some(created.created_at + chrono::Duration::minutes(1)),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);

        let filter = ContentFilter {
            from: Some(created.created_at + chrono::Duration::minutes(1)),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
    }
}
