//! The auth gate: extracting and verifying the access credential.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::{session, tokens},
    db::handlers::Users,
    errors::{Error, Result},
};

/// Extract a bearer token from the Authorization header if present.
fn bearer_token(parts: &Parts) -> Option<String> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|token| token.to_string())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    /// Authenticate the request from its access credential.
    ///
    /// The Authorization header is tried first, then the access-token
    /// cookie. Expired, malformed and bad-signature credentials all
    /// collapse to `Unauthenticated` for the caller; only server-side
    /// faults keep their own kind. The refresh slot is never consulted:
    /// access tokens are stateless and accepted purely on signature and
    /// expiry.
    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)
            .or_else(|| session::cookie_value(&parts.headers, &state.config.auth.session.access_cookie_name));

        let Some(token) = token else {
            trace!("No access credential found in request");
            return Err(Error::Unauthenticated { message: None });
        };

        let claims = match tokens::verify_access_token(&token, &state.config) {
            Ok(claims) => claims,
            Err(err @ Error::Internal { .. }) => return Err(err),
            Err(err) => {
                trace!("Access credential failed verification: {err:?}");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut users = Users::new(&mut conn);

        // The subject may have been created and later removed from the
        // store; a credential without a subject is no credential at all.
        let user = users
            .get_by_id(claims.sub)
            .await?
            .ok_or(Error::Unauthenticated { message: None })?;

        Ok(CurrentUser::from(user))
    }
}
