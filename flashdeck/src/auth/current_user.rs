use crate::{
    AppState,
    auth::session,
    errors::{Error, Result},
    types::{UserId, abbrev_uuid},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, warn};

use super::provider::AuthProviderError;

const MISSING_BEARER: &str = "Missing or invalid Authorization header.";

/// The authenticated caller, resolved from `Authorization: Bearer <access token>`
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Pull the token out of an `Authorization` header value. The scheme is case-insensitive.
pub(crate) fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_bearer)
            .ok_or_else(|| Error::Unauthenticated {
                message: Some(MISSING_BEARER.to_string()),
            })?;

        // Local verification when the signing secret is known
        if let Some(secret) = state.config.auth.jwt_secret.as_deref() {
            let user = session::verify_access_token(token, secret)?;
            debug!("Authenticated user {} from verified token", abbrev_uuid(&user.id));
            return Ok(user);
        }

        match state.auth.get_user(token).await {
            Ok(user) => {
                debug!("Authenticated user {} via auth provider", abbrev_uuid(&user.id));
                Ok(CurrentUser {
                    id: user.id,
                    email: user.email,
                })
            }
            Err(AuthProviderError::Rejected { status, .. }) => {
                debug!(status, "Auth provider rejected bearer token");
                Err(Error::Unauthenticated { message: None })
            }
            Err(e) => {
                warn!("Bearer token could not be checked: {e}");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}
