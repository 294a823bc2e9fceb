//! # edulink: a course platform backend
//!
//! `edulink` is the backend of a multi-tenant content/course platform:
//! account registration, credential-based login, stateful session renewal
//! via rotating refresh tokens, role-based authorization, and
//! ownership-scoped mutation of course and content resources.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses SQLx over SQLite for persistence, giving a fully
//! self-contained single-binary deployment.
//!
//! ### Request flow
//!
//! Every request to a protected endpoint passes through the auth gate (the
//! [`api::models::users::CurrentUser`] extractor): the access credential is
//! pulled from the Authorization header or cookie, verified against the
//! access-token secret, and resolved to a stored identity. Handlers then
//! compose the role guard and the ownership policy from [`auth::policy`] as
//! the operation requires, and finally talk to the database through the
//! repositories in [`db::handlers`].
//!
//! Session state is a single refresh-token slot per identity. Login and
//! renewal mint a fresh access/refresh pair and overwrite the slot, which
//! implicitly revokes the previous refresh token; logout clears it. Access
//! tokens are stateless and never checked against the slot.
//!
//! ### Core components
//!
//! - [`auth`]: password hashing, the two-secret token service, session
//!   binding/rotation, the request extractor and the authorization policies
//! - [`api`]: HTTP handlers and the request/response contract
//! - [`db`]: repositories and database models
//! - [`media`]: the external blob-storage collaborator
//! - [`config`]: YAML + environment configuration
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use edulink::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = edulink::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     edulink::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use bon::Builder;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use types::{ContentId, CourseId, UserId};

use crate::media::MediaClient;
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub media: MediaClient,
}

/// Get the edulink database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials))
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let user_routes = Router::new()
        .route("/users/signup", post(api::handlers::auth::signup))
        .route("/users/login", post(api::handlers::auth::login))
        .route("/users/refresh", post(api::handlers::auth::refresh))
        .route("/users/logout", post(api::handlers::auth::logout))
        .route("/users/me", get(api::handlers::auth::me))
        .route("/users/dashboard", get(api::handlers::auth::dashboard));

    let course_routes = Router::new()
        .route(
            "/courses",
            post(api::handlers::courses::create_course).get(api::handlers::courses::list_courses),
        )
        .route(
            "/courses/{id}",
            get(api::handlers::courses::get_course)
                .put(api::handlers::courses::update_course)
                .delete(api::handlers::courses::delete_course),
        )
        .route("/courses/{id}/enroll", post(api::handlers::courses::enroll))
        .route("/courses/{id}/contents", post(api::handlers::courses::add_content));

    let content_routes = Router::new()
        .route(
            "/contents",
            post(api::handlers::contents::upload_content).get(api::handlers::contents::list_contents),
        )
        .route("/contents/{id}", delete(api::handlers::contents::delete_content));

    let api_routes = user_routes.merge(course_routes).merge(content_routes).with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations
///    and builds the router
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting edulink with configuration: {:#?}", config);

        let pool = db::connect(&config.database).await?;
        migrator().run(&pool).await?;

        let media = MediaClient::new(&config.media)?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).media(media).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("edulink listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::api::models::auth::{AuthBody, RegisterResponse, TokenBody};
    use crate::api::models::courses::CourseResponse;
    use crate::api::models::users::Role;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    /// End-to-end: register -> login -> renew via cookie -> old refresh
    /// token is dead, the new one works.
    #[test_log::test(tokio::test)]
    async fn test_register_login_renew_flow() {
        let (server, _state) = create_test_app().await;

        // Register
        let response = server
            .post("/api/v1/users/signup")
            .multipart(signup_form("alice", "a@x.com", "password-1", "student"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let registered: RegisterResponse = response.json();
        assert_eq!(registered.user.username, "alice");

        // Login with the correct password, receive both cookies
        let response = server
            .post("/api/v1/users/login")
            .json(&json!({ "username": "alice", "password": "password-1" }))
            .await;
        response.assert_status_ok();
        let login: AuthBody = response.json();
        let access_cookie = cookie_from_response(&response, "accessToken").unwrap();
        let refresh_cookie = cookie_from_response(&response, "refreshToken").unwrap();
        assert_eq!(access_cookie, login.access_token);
        assert_eq!(refresh_cookie, login.refresh_token);

        // The access cookie authenticates requests
        let response = server
            .get("/api/v1/users/me")
            .add_header("cookie", format!("accessToken={access_cookie}"))
            .await;
        response.assert_status_ok();

        // Renew with the refresh cookie
        let response = server
            .post("/api/v1/users/refresh")
            .add_header("cookie", format!("refreshToken={refresh_cookie}"))
            .await;
        response.assert_status_ok();
        let renewed: TokenBody = response.json();
        let new_refresh_cookie = cookie_from_response(&response, "refreshToken").unwrap();
        assert_eq!(new_refresh_cookie, renewed.refresh_token);
        assert_ne!(renewed.refresh_token, login.refresh_token);

        // The old refresh token was rotated away
        let response = server
            .post("/api/v1/users/refresh")
            .add_header("cookie", format!("refreshToken={refresh_cookie}"))
            .await;
        response.assert_status_unauthorized();

        // The new one works
        let response = server
            .post("/api/v1/users/refresh")
            .add_header("cookie", format!("refreshToken={}", renewed.refresh_token))
            .await;
        response.assert_status_ok();
    }

    /// End-to-end: an instructor's course can only be deleted by its
    /// creator; a different student identity is refused.
    #[test_log::test(tokio::test)]
    async fn test_course_ownership_flow() {
        let (server, state) = create_test_app().await;
        let mut conn = state.db.acquire().await.unwrap();
        let instructor = insert_test_user(&mut conn, Role::Instructor).await;
        let student = insert_test_user(&mut conn, Role::Student).await;
        drop(conn);

        let instructor_login = login_test_user(&server, &instructor).await;
        let response = server
            .post("/api/v1/courses")
            .add_header("authorization", format!("Bearer {}", instructor_login.access_token))
            .json(&json!({ "title": "Systems Programming", "description": "Pointers and pain" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let course: CourseResponse = response.json();

        // A different student identity cannot delete it
        let student_login = login_test_user(&server, &student).await;
        let response = server
            .delete(&format!("/api/v1/courses/{}", course.id))
            .add_header("authorization", format!("Bearer {}", student_login.access_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // The creating instructor can
        let response = server
            .delete(&format!("/api/v1/courses/{}", course.id))
            .add_header("authorization", format!("Bearer {}", instructor_login.access_token))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server
            .get(&format!("/api/v1/courses/{}", course.id))
            .add_header("authorization", format!("Bearer {}", instructor_login.access_token))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    /// End-to-end: a student hitting the role-guarded course creation is
    /// refused and nothing is persisted.
    #[test_log::test(tokio::test)]
    async fn test_role_guard_blocks_course_creation() {
        let (server, state) = create_test_app().await;
        let mut conn = state.db.acquire().await.unwrap();
        let student = insert_test_user(&mut conn, Role::Student).await;
        drop(conn);

        let login = login_test_user(&server, &student).await;
        let response = server
            .post("/api/v1/courses")
            .add_header("authorization", format!("Bearer {}", login.access_token))
            .json(&json!({ "title": "Not allowed", "description": "Should never exist" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .get("/api/v1/courses")
            .add_header("authorization", format!("Bearer {}", login.access_token))
            .await;
        let courses: Vec<CourseResponse> = response.json();
        assert!(courses.is_empty());
    }

    #[tokio::test]
    async fn test_healthz() {
        let (server, _state) = create_test_app().await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }
}
