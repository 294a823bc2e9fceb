//! Access and refresh token creation and verification.
//!
//! Two token classes are minted with independent secrets so a refresh token
//! can never be replayed as an access token (or vice versa). Verification is
//! a pure function of the token and the configured signing material; neither
//! class is looked up anywhere at this layer.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::Error,
    types::UserId,
};

/// Claims carried by a short-lived access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId, // Subject (user ID)
    pub role: Role,  // Account role
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl AccessClaims {
    /// Create new access claims for a user
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.access_token_ttl;

        Self {
            sub: user.id,
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Claims carried by a long-lived refresh token. Subject only: the role is
/// re-read from the identity record at renewal time.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub exp: i64,
    pub iat: i64,
    // Uniqueness nonce: iat has second granularity, so without it two
    // rotations inside the same second would mint byte-identical tokens and
    // the stored-slot comparison could not distinguish old from new.
    pub jti: uuid::Uuid,
}

impl RefreshClaims {
    pub fn new(user_id: UserId, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.refresh_token_ttl;

        Self {
            sub: user_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4(),
        }
    }
}

/// Create a signed access token for a user
pub fn issue_access_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    sign(&AccessClaims::new(user, config), &config.auth.access_token_secret)
}

/// Create a signed refresh token for a subject
pub fn issue_refresh_token(user_id: UserId, config: &Config) -> Result<String, Error> {
    sign(&RefreshClaims::new(user_id, config), &config.auth.refresh_token_secret)
}

/// Verify and decode an access token.
///
/// Expired, malformed and bad-signature tokens all surface as
/// [`Error::Unauthenticated`]; only key/crypto setup problems are internal.
pub fn verify_access_token(token: &str, config: &Config) -> Result<AccessClaims, Error> {
    verify(token, &config.auth.access_token_secret, Error::Unauthenticated { message: None })
}

/// Verify and decode a refresh token.
///
/// Client-class failures surface as [`Error::InvalidToken`]; the stored-slot
/// comparison that completes refresh validation happens at the session
/// layer, not here.
pub fn verify_refresh_token(token: &str, config: &Config) -> Result<RefreshClaims, Error> {
    verify(token, &config.auth.refresh_token_secret, Error::InvalidToken)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, Error> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str, client_error: Error) -> Result<T, Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<T>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => client_error,

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // Catch-all for any future error variants (default to server error for safety)
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}
