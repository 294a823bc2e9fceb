//! Content handlers: upload, filtered listing, deletion.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use bytes::Bytes;

use crate::{
    AppState,
    api::models::{
        contents::{ContentKind, ContentListResponse, ContentResponse, ListContentsQuery, ListMetadata},
        pagination::Pagination,
        users::{CurrentUser, Role},
    },
    auth::policy,
    db::{
        handlers::{Contents, Repository, contents::ContentFilter},
        models::contents::ContentCreateDBRequest,
    },
    errors::Error,
    types::{ContentId, Operation},
};

/// Roles that may delete content they did not create.
const CONTENT_OVERRIDE_ROLES: [Role; 2] = [Role::Instructor, Role::Admin];

/// Multipart fields accepted by the upload endpoint.
#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    kind: Option<String>,
    tags: Option<String>,
    file: Option<(String, Bytes)>,
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, Error> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let text_error = |e| Error::BadRequest {
            message: format!("Invalid multipart request: {e}"),
        };
        match name.as_str() {
            "title" => form.title = Some(field.text().await.map_err(text_error)?),
            "description" => form.description = Some(field.text().await.map_err(text_error)?),
            "kind" => form.kind = Some(field.text().await.map_err(text_error)?),
            "tags" => form.tags = Some(field.text().await.map_err(text_error)?),
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(text_error)?;
                form.file = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Upload a content item
#[utoipa::path(
    post,
    path = "/api/v1/contents",
    tag = "contents",
    responses(
        (status = 201, description = "Content uploaded", body = ContentResponse),
        (status = 400, description = "Missing fields or upload failed"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_content(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ContentResponse>), Error> {
    let form = read_upload_form(&mut multipart).await?;

    let title = match form.title {
        Some(title) if !title.trim().is_empty() => title.trim().to_string(),
        _ => {
            return Err(Error::BadRequest {
                message: "title is required".to_string(),
            });
        }
    };
    let kind: ContentKind = match form.kind {
        Some(kind) => kind.parse().map_err(|e: String| Error::BadRequest { message: e })?,
        None => {
            return Err(Error::BadRequest {
                message: "kind is required".to_string(),
            });
        }
    };
    let Some((file_name, bytes)) = form.file else {
        return Err(Error::BadRequest {
            message: "A file upload is required".to_string(),
        });
    };

    // The media store is an external collaborator: its failures degrade to
    // None and are surfaced to the caller here, never retried.
    let media = state.media.upload(&file_name, bytes).await.ok_or_else(|| Error::BadRequest {
        message: "Unable to upload file to media storage".to_string(),
    })?;

    let tags = form
        .tags
        .map(|tags| tags.split(',').map(|tag| tag.to_string()).collect())
        .unwrap_or_default();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let content = Contents::new(&mut conn)
        .create(&ContentCreateDBRequest {
            title,
            description: form.description,
            kind,
            file_url: media.url,
            duration: media.duration.unwrap_or(0.0).round() as i64,
            tags,
            instructor_id: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ContentResponse::from(content))))
}

/// List content with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/v1/contents",
    params(ListContentsQuery, Pagination),
    tag = "contents",
    responses(
        (status = 200, description = "Content listing", body = ContentListResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_contents(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListContentsQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ContentListResponse>, Error> {
    let filter = ContentFilter {
        kind: query.kind,
        title: query.title,
        uploaded_by: query.uploaded_by,
        from: query.from,
        to: query.to,
        sort_by: query.sort_by,
        order: query.order,
        skip: pagination.offset(),
        limit: pagination.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut contents = Contents::new(&mut conn);

    let total = contents.count(&filter).await?;
    let items = contents.list(&filter).await?;

    Ok(Json(ContentListResponse {
        metadata: ListMetadata {
            total,
            page: pagination.page(),
            limit: pagination.limit(),
            total_pages: pagination.total_pages(total),
        },
        content: items.into_iter().map(ContentResponse::from).collect(),
    }))
}

/// Delete a content item (creator, or instructor/admin override)
#[utoipa::path(
    delete,
    path = "/api/v1/contents/{id}",
    params(("id" = String, Path, description = "Content ID")),
    tag = "contents",
    responses(
        (status = 204, description = "Content deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator and no override role"),
        (status = 404, description = "Content not found"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_content(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ContentId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut contents = Contents::new(&mut conn);

    let content = contents.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Content".to_string(),
        id: id.to_string(),
    })?;

    policy::authorize_owner(&user, content.instructor_id, &CONTENT_OVERRIDE_ROLES, Operation::Delete, "this content")?;

    contents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
