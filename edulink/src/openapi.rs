//! OpenAPI documentation aggregation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::auth::signup,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::refresh,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::me,
        crate::api::handlers::auth::dashboard,
        crate::api::handlers::courses::create_course,
        crate::api::handlers::courses::list_courses,
        crate::api::handlers::courses::get_course,
        crate::api::handlers::courses::update_course,
        crate::api::handlers::courses::delete_course,
        crate::api::handlers::courses::enroll,
        crate::api::handlers::courses::add_content,
        crate::api::handlers::contents::upload_content,
        crate::api::handlers::contents::list_contents,
        crate::api::handlers::contents::delete_content,
    ),
    components(schemas(
        crate::api::models::users::Role,
        crate::api::models::users::UserResponse,
        crate::api::models::users::CurrentUser,
        crate::api::models::auth::LoginRequest,
        crate::api::models::auth::RefreshRequest,
        crate::api::models::auth::RegisterResponse,
        crate::api::models::auth::AuthBody,
        crate::api::models::auth::TokenBody,
        crate::api::models::auth::MessageResponse,
        crate::api::models::auth::DashboardResponse,
        crate::api::models::courses::CourseCreate,
        crate::api::models::courses::CourseUpdate,
        crate::api::models::courses::CourseResponse,
        crate::api::models::courses::AttachContentResponse,
        crate::api::models::contents::ContentKind,
        crate::api::models::contents::ContentResponse,
        crate::api::models::contents::ContentListResponse,
        crate::api::models::contents::ListMetadata,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Account registration, login and session renewal"),
        (name = "courses", description = "Course management and enrollment"),
        (name = "contents", description = "Content upload and discovery"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
        components.add_security_scheme(
            "access_token_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("accessToken"))),
        );
    }
}
