//! Authentication handlers: registration, login, token renewal, logout and
//! the authenticated identity endpoints.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
};
use bytes::Bytes;

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthBody, DashboardResponse, LoginRequest, LoginResponse, LogoutResponse, MessageResponse, RefreshRequest,
            RefreshResponse, RegisterResponse, TokenBody,
        },
        users::{CurrentUser, Role},
    },
    auth::{password, password::Argon2Params, policy, session, tokens},
    db::{handlers::Users, models::users::UserCreateDBRequest},
    errors::Error,
    types::Operation,
};

/// Multipart fields accepted by the signup endpoint.
#[derive(Default)]
struct SignupForm {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
    avatar: Option<(String, Bytes)>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Error {
    Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, Error> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::BadRequest {
            message: format!("{name} is required"),
        }),
    }
}

async fn read_signup_form(multipart: &mut Multipart) -> Result<SignupForm, Error> {
    let mut form = SignupForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => form.username = Some(field.text().await.map_err(multipart_error)?),
            "email" => form.email = Some(field.text().await.map_err(multipart_error)?),
            "password" => form.password = Some(field.text().await.map_err(multipart_error)?),
            "role" => form.role = Some(field.text().await.map_err(multipart_error)?),
            "avatar" => {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.avatar = Some((file_name, bytes));
            }
            _ => {} // unknown fields are ignored
        }
    }

    Ok(form)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/users/signup",
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(State(state): State<AppState>, mut multipart: Multipart) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let form = read_signup_form(&mut multipart).await?;
    let username = required(form.username, "username")?.to_lowercase();
    let email = required(form.email, "email")?;
    let password = required(form.password, "password")?;
    let role: Role = required(form.role, "role")?.parse().map_err(|e: String| Error::BadRequest { message: e })?;

    // Validate password length
    let password_config = &state.config.auth.password;
    if password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    // One combined lookup covers both uniqueness rules; the database
    // constraints remain as a backstop for concurrent registrations.
    if users.find_by_username_or_email(&username, &email).await?.is_some() {
        return Err(Error::Conflict {
            message: "User with this email or username already exists".to_string(),
        });
    }

    // The avatar goes through the external media store. A degraded (null)
    // upload result fails the registration rather than silently dropping
    // the file.
    let avatar_url = match form.avatar {
        Some((file_name, bytes)) => {
            let media = state.media.upload(&file_name, bytes).await.ok_or_else(|| Error::BadRequest {
                message: "Unable to upload avatar to media storage".to_string(),
            })?;
            Some(media.url)
        }
        None => None,
    };

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let params = Argon2Params::from(password_config);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let created = users
        .create(&UserCreateDBRequest {
            username,
            email,
            password_hash,
            role,
            avatar_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: created.into(),
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login with username or email and password
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthBody),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "Unknown identity"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let username = request.username.unwrap_or_default().trim().to_lowercase();
    let email = request.email.unwrap_or_default().trim().to_string();

    if username.is_empty() && email.is_empty() {
        return Err(Error::BadRequest {
            message: "Username or email is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let identifier = if username.is_empty() { email.clone() } else { username.clone() };
    let user = users
        .find_by_username_or_email(&username, &email)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: identifier,
        })?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let candidate = request.password;
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&candidate, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid password".to_string()),
        });
    }

    let pair = session::establish_session(&mut conn, &user, &state.config).await?;
    let cookies = session::session_cookies(&pair, &state.config);

    Ok(LoginResponse {
        body: AuthBody {
            user: user.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            message: "Login successful".to_string(),
        },
        cookies,
    })
}

/// Exchange a refresh token for a new token pair.
///
/// The rotation protocol: extract the credential (cookie or body), verify
/// it cryptographically, load the subject, require an exact match against
/// the stored session slot, then mint and store a new pair. The old refresh
/// token is unusable the instant the new one is stored.
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Tokens renewed", body = TokenBody),
        (status = 401, description = "Missing, invalid or superseded refresh token"),
        (status = 404, description = "Subject no longer exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<RefreshResponse, Error> {
    let presented = session::cookie_value(&headers, &state.config.auth.session.refresh_cookie_name)
        .or_else(|| body.and_then(|Json(request)| request.refresh_token));

    let Some(presented) = presented else {
        return Err(Error::Unauthenticated {
            message: Some("Refresh token is required".to_string()),
        });
    };

    let claims = tokens::verify_refresh_token(&presented, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users.get_by_id(claims.sub).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: claims.sub.to_string(),
    })?;

    // Exact match against the stored slot. A token that was rotated away
    // (or a session that was logged out) fails here; revocation is implicit
    // in the overwrite, there is no blacklist.
    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(Error::InvalidToken);
    }

    let pair = session::establish_session(&mut conn, &user, &state.config).await?;
    let cookies = session::session_cookies(&pair, &state.config);

    Ok(RefreshResponse {
        body: TokenBody {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            message: "Tokens renewed successfully".to_string(),
        },
        cookies,
    })
}

/// Logout: clear the session slot and expire both cookies
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> Result<LogoutResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Users::new(&mut conn).set_refresh_token(user.id, None).await?;

    Ok(LogoutResponse {
        body: MessageResponse {
            message: "Logout successful".to_string(),
        },
        cookies: session::clear_session_cookies(&state.config),
    })
}

/// Current authenticated identity
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Authenticated identity", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn me(user: CurrentUser) -> Json<CurrentUser> {
    Json(user)
}

/// Instructor dashboard (role-guarded)
#[utoipa::path(
    get,
    path = "/api/v1/users/dashboard",
    tag = "authentication",
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Role not allowed"),
    ),
    security(("bearer_token" = []), ("access_token_cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(user: CurrentUser) -> Result<Json<DashboardResponse>, Error> {
    policy::authorize(&user, &[Role::Instructor, Role::Admin], Operation::Read, "the dashboard")?;

    Ok(Json(DashboardResponse {
        user_id: user.id,
        role: user.role,
        message: "Dashboard access granted".to_string(),
    }))
}
