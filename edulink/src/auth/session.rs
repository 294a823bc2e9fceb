//! Session binding: minting token pairs, persisting the refresh slot, and
//! the cookie plumbing shared by login, renewal and logout.
//!
//! The only mutable per-user session state is the refresh-token slot on the
//! identity record. [`establish_session`] overwrites it unconditionally, so
//! the previously issued refresh token becomes unusable the instant the new
//! one is stored: single active token, no grace window.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use utoipa::ToSchema;

use crate::{
    api::models::users::CurrentUser,
    auth::tokens,
    config::Config,
    db::{handlers::Users, models::users::UserDBResponse},
    errors::Result,
};

/// A freshly minted access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mint a new token pair for the user and persist the refresh token into the
/// session binding slot, replacing whatever was there.
pub async fn establish_session(db: &mut SqliteConnection, user: &UserDBResponse, config: &Config) -> Result<TokenPair> {
    let identity = CurrentUser::from(user.clone());
    let access_token = tokens::issue_access_token(&identity, config)?;
    let refresh_token = tokens::issue_refresh_token(user.id, config)?;

    Users::new(db).set_refresh_token(user.id, Some(&refresh_token)).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Build the Set-Cookie values carrying a token pair.
pub fn session_cookies(pair: &TokenPair, config: &Config) -> [String; 2] {
    let session = &config.auth.session;
    [
        format_cookie(
            &session.access_cookie_name,
            &pair.access_token,
            config.auth.access_token_ttl.as_secs(),
            config,
        ),
        format_cookie(
            &session.refresh_cookie_name,
            &pair.refresh_token,
            config.auth.refresh_token_ttl.as_secs(),
            config,
        ),
    ]
}

/// Build expired Set-Cookie values clearing both token cookies.
pub fn clear_session_cookies(config: &Config) -> [String; 2] {
    let session = &config.auth.session;
    [
        format_cookie(&session.access_cookie_name, "", 0, config),
        format_cookie(&session.refresh_cookie_name, "", 0, config),
    ]
}

/// The Secure flag is applied uniformly from configuration; there is no
/// per-endpoint variation.
fn format_cookie(name: &str, value: &str, max_age: u64, config: &Config) -> String {
    let session = &config.auth.session;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        name, value, session.cookie_same_site, max_age
    );
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extract a cookie value from a request's Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((cookie_name, value)) = cookie.split_once('=') {
            if cookie_name == name {
                return Some(value.to_string());
            }
        }
    }
    None
}
