//! Shared helpers for the test suite: hermetic in-memory databases, a
//! pre-wired test server, and fixture users per role.

use axum_test::TestServer;
use axum_test::multipart::MultipartForm;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    AppState, build_router,
    api::models::{auth::AuthBody, contents::ContentKind, users::Role},
    auth::password::{self, Argon2Params},
    config::Config,
    db::{
        self,
        handlers::{Contents, Repository, Users},
        models::{
            contents::{ContentCreateDBRequest, ContentDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    media::MediaClient,
    migrator,
};

/// Password used by every fixture user.
pub const TEST_PASSWORD: &str = "password123";

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    // A single pooled connection keeps the in-memory database alive and
    // serializes test requests
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.database.min_connections = 1;
    config.auth.access_token_secret = "test-access-secret-0123456789abcdefgh".to_string();
    config.auth.refresh_token_secret = "test-refresh-secret-0123456789abcdefgh".to_string();
    // Fast hashing parameters keep the suite quick
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

fn fast_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub async fn create_test_pool() -> SqlitePool {
    let config = create_test_config();
    let pool = db::connect(&config.database).await.expect("Failed to open test database");
    migrator().run(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn create_test_state_with_config(config: Config) -> AppState {
    let pool = db::connect(&config.database).await.expect("Failed to open test database");
    migrator().run(&pool).await.expect("Failed to run migrations");
    let media = MediaClient::new(&config.media).expect("Failed to build media client");

    AppState::builder().db(pool).config(config).media(media).build()
}

pub async fn create_test_state() -> AppState {
    create_test_state_with_config(create_test_config()).await
}

pub async fn create_test_app() -> (TestServer, AppState) {
    let state = create_test_state().await;
    let router = build_router(state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

/// Test app wired to a (mock) media store at the given base URL.
pub async fn create_test_app_with_media(media_base_url: &str) -> (TestServer, AppState) {
    let mut config = create_test_config();
    config.media.enabled = true;
    config.media.upload_url = Some(format!("{media_base_url}/upload").parse().expect("Invalid media URL"));

    let state = create_test_state_with_config(config).await;
    let router = build_router(state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

/// Insert a user with a unique username and [`TEST_PASSWORD`].
pub async fn insert_test_user(conn: &mut SqliteConnection, role: Role) -> UserDBResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("user{}", &suffix[..8]);
    let password_hash =
        password::hash_string_with_params(TEST_PASSWORD, Some(fast_argon2_params())).expect("Failed to hash password");

    Users::new(conn)
        .create(&UserCreateDBRequest {
            username: username.clone(),
            email: format!("{username}@example.com"),
            password_hash,
            role,
            avatar_url: None,
        })
        .await
        .expect("Failed to insert test user")
}

/// Insert a content item owned by the given instructor.
pub async fn insert_test_content(conn: &mut SqliteConnection, instructor_id: Uuid) -> ContentDBResponse {
    let suffix = Uuid::new_v4().simple().to_string();

    Contents::new(conn)
        .create(&ContentCreateDBRequest {
            title: format!("content{}", &suffix[..8]),
            description: None,
            kind: ContentKind::Video,
            file_url: format!("https://cdn.example.com/{suffix}.mp4"),
            duration: 60,
            tags: Vec::new(),
            instructor_id,
        })
        .await
        .expect("Failed to insert test content")
}

/// Multipart body for the signup endpoint (no avatar part).
pub fn signup_form(username: &str, email: &str, password: &str, role: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("username", username)
        .add_text("email", email)
        .add_text("password", password)
        .add_text("role", role)
}

/// Login a fixture user and return the response body with both tokens.
pub async fn login_test_user(server: &TestServer, user: &UserDBResponse) -> AuthBody {
    let response = server
        .post("/api/v1/users/login")
        .json(&serde_json::json!({ "username": user.username, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Extract a cookie value from a response's Set-Cookie headers.
pub fn cookie_from_response(response: &axum_test::TestResponse, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            cookie
                .strip_prefix(&format!("{name}="))
                .map(|rest| rest.split(';').next().unwrap_or(rest).to_string())
        })
}
