//! Course handlers: CRUD, enrollment and content attachment.
//!
//! Creation is role-guarded; update, delete and attachment apply the
//! ownership policy after the course is loaded.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use bytes::Bytes;

use crate::{
    AppState,
    api::models::{
        contents::ContentKind,
        courses::{AttachContentResponse, CourseCreate, CourseResponse, CourseUpdate},
        pagination::Pagination,
        users::{CurrentUser, Role},
    },
    auth::policy,
    db::{
        handlers::{Contents, Courses, Repository, courses::CourseFilter},
        models::{
            contents::ContentCreateDBRequest,
            courses::{CourseCreateDBRequest, CourseDBResponse, CourseUpdateDBRequest},
        },
    },
    errors::Error,
    types::{ContentId, CourseId, Operation},
};

/// Roles allowed to create courses.
const COURSE_CREATOR_ROLES: [Role; 2] = [Role::Instructor, Role::Admin];
/// Roles that may mutate a course they did not create.
const COURSE_OVERRIDE_ROLES: [Role; 1] = [Role::Admin];

async fn load_course(conn: &mut sqlx::SqliteConnection, id: CourseId) -> Result<CourseDBResponse, Error> {
    Courses::new(conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Course".to_string(),
        id: id.to_string(),
    })
}

/// Create a course
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CourseCreate,
    tag = "courses",
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Missing title or description"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Role not allowed"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), Error> {
    policy::authorize(&user, &COURSE_CREATOR_ROLES, Operation::Create, "courses")?;

    if request.title.trim().is_empty() || request.description.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Title and description are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let course = Courses::new(&mut conn)
        .create(&CourseCreateDBRequest {
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            instructor_id: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from(course))))
}

/// List courses
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(Pagination),
    tag = "courses",
    responses(
        (status = 200, description = "Courses", body = [CourseResponse]),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_courses(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<CourseResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let courses = Courses::new(&mut conn)
        .list(&CourseFilter::new(pagination.offset(), pagination.limit()))
        .await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// Get a course by ID
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    tag = "courses",
    responses(
        (status = 200, description = "Course", body = CourseResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_course(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<CourseId>,
) -> Result<Json<CourseResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let course = load_course(&mut conn, id).await?;
    Ok(Json(CourseResponse::from(course)))
}

/// Update a course (creator or admin)
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    request_body = CourseUpdate,
    tag = "courses",
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CourseId>,
    Json(request): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // Ownership needs the stored creator, so the course is loaded first
    let course = load_course(&mut conn, id).await?;
    policy::authorize_owner(&user, course.instructor_id, &COURSE_OVERRIDE_ROLES, Operation::Update, "this course")?;

    let updated = Courses::new(&mut conn)
        .update(
            id,
            &CourseUpdateDBRequest {
                title: request.title,
                description: request.description,
            },
        )
        .await?;

    Ok(Json(CourseResponse::from(updated)))
}

/// Delete a course (creator or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    tag = "courses",
    responses(
        (status = 204, description = "Course deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CourseId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let course = load_course(&mut conn, id).await?;
    policy::authorize_owner(&user, course.instructor_id, &COURSE_OVERRIDE_ROLES, Operation::Delete, "this course")?;

    Courses::new(&mut conn).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enroll the authenticated user in a course
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = String, Path, description = "Course ID")),
    tag = "courses",
    responses(
        (status = 200, description = "Enrolled", body = CourseResponse),
        (status = 400, description = "Already enrolled"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn enroll(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CourseId>,
) -> Result<Json<CourseResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let course = load_course(&mut conn, id).await?;

    let mut courses = Courses::new(&mut conn);
    if !courses.enroll_student(course.id, user.id).await? {
        return Err(Error::BadRequest {
            message: "You are already enrolled in this course".to_string(),
        });
    }

    let course = load_course(&mut conn, id).await?;
    Ok(Json(CourseResponse::from(course)))
}

/// Multipart fields accepted by the attach-content endpoint.
#[derive(Default)]
struct AttachContentForm {
    content_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    kind: Option<String>,
    file: Option<(String, Bytes)>,
}

async fn read_attach_form(multipart: &mut Multipart) -> Result<AttachContentForm, Error> {
    let mut form = AttachContentForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let text_error = |e| Error::BadRequest {
            message: format!("Invalid multipart request: {e}"),
        };
        match name.as_str() {
            "content_id" => form.content_id = Some(field.text().await.map_err(text_error)?),
            "title" => form.title = Some(field.text().await.map_err(text_error)?),
            "description" => form.description = Some(field.text().await.map_err(text_error)?),
            "kind" => form.kind = Some(field.text().await.map_err(text_error)?),
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

/// Attach content to a course: either an existing content item by ID, or a
/// fresh upload through the media collaborator.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/contents",
    params(("id" = String, Path, description = "Course ID")),
    tag = "courses",
    responses(
        (status = 200, description = "Content attached", body = AttachContentResponse),
        (status = 400, description = "Nothing to attach, duplicate attachment, or upload failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Course or content not found"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_content(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CourseId>,
    mut multipart: Multipart,
) -> Result<Json<AttachContentResponse>, Error> {
    let form = read_attach_form(&mut multipart).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let course = load_course(&mut conn, id).await?;
    policy::authorize_owner(&user, course.instructor_id, &COURSE_OVERRIDE_ROLES, Operation::Update, "this course")?;

    let added_content_id: ContentId = if let Some(content_id) = form.content_id {
        // Attach an existing content item
        let content_id: ContentId = content_id.trim().parse().map_err(|_| Error::BadRequest {
            message: "Invalid content ID".to_string(),
        })?;

        let mut contents = Contents::new(&mut conn);
        contents.get_by_id(content_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Content".to_string(),
            id: content_id.to_string(),
        })?;

        if !Courses::new(&mut conn).attach_content(id, content_id).await? {
            return Err(Error::BadRequest {
                message: "Content already exists in the course".to_string(),
            });
        }
        content_id
    } else if let Some((file_name, bytes)) = form.file {
        // Upload a new content item through the media collaborator. The
        // upload degrades to None on failure; that is surfaced here.
        let media = state.media.upload(&file_name, bytes).await.ok_or_else(|| Error::BadRequest {
            message: "Unable to upload file to media storage".to_string(),
        })?;

        let kind = match form.kind {
            Some(kind) => kind.parse::<ContentKind>().map_err(|e| Error::BadRequest { message: e })?,
            None => ContentKind::Other,
        };

        let content = Contents::new(&mut conn)
            .create(&ContentCreateDBRequest {
                title: form.title.filter(|t| !t.trim().is_empty()).unwrap_or(file_name),
                description: form.description,
                kind,
                file_url: media.url,
                duration: media.duration.unwrap_or(0.0).round() as i64,
                tags: Vec::new(),
                instructor_id: user.id,
            })
            .await?;

        Courses::new(&mut conn).attach_content(id, content.id).await?;
        content.id
    } else {
        return Err(Error::BadRequest {
            message: "Either content_id or a file must be provided".to_string(),
        });
    };

    let course = load_course(&mut conn, id).await?;
    Ok(Json(AttachContentResponse {
        course: CourseResponse::from(course),
        added_content_id,
    }))
}
