//! API request/response models for authentication endpoints.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::{Role, UserResponse};
use crate::types::UserId;

/// Login request. At least one of `username`/`email` must be provided.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Renewal request body. Clients without the refresh cookie can pass the
/// token here instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Registration result. The created identity never carries the password
/// hash or a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: String,
}

/// Login result body: identity snapshot plus both tokens. The same tokens
/// are also set as HTTP-only cookies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthBody {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub message: String,
}

/// Renewal result body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBody {
    pub access_token: String,
    pub refresh_token: String,
    pub message: String,
}

/// Simple message-only body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Role-guarded dashboard snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub role: Role,
    pub message: String,
}

/// Login response: JSON body plus both session cookies.
#[derive(Debug)]
pub struct LoginResponse {
    pub body: AuthBody,
    pub cookies: [String; 2],
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let response = (StatusCode::OK, Json(self.body)).into_response();
        with_cookies(response, &self.cookies)
    }
}

/// Renewal response: new token pair in the body plus refreshed cookies.
#[derive(Debug)]
pub struct RefreshResponse {
    pub body: TokenBody,
    pub cookies: [String; 2],
}

impl IntoResponse for RefreshResponse {
    fn into_response(self) -> Response {
        let response = (StatusCode::OK, Json(self.body)).into_response();
        with_cookies(response, &self.cookies)
    }
}

/// Logout response: message body plus expired cookies.
#[derive(Debug)]
pub struct LogoutResponse {
    pub body: MessageResponse,
    pub cookies: [String; 2],
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        let response = (StatusCode::OK, Json(self.body)).into_response();
        with_cookies(response, &self.cookies)
    }
}

fn with_cookies(mut response: Response, cookies: &[String]) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                // Cookies are built internally from token strings; a value
                // that fails header encoding is a bug worth surfacing loudly.
                tracing::error!("Failed to encode session cookie: {e}");
            }
        }
    }
    response
}
