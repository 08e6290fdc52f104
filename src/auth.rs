use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::{error::ApiError, token::TokenService};

pub const MISSING_HEADER_MESSAGE: &str = "Authorization header missing";
pub const NOT_LOGGED_IN_MESSAGE: &str = "You are not logged in";

/// AuthUser
///
/// The resolved identity of an authenticated request. The auth middleware stores
/// it in the request extensions; handlers take it as an argument.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// authenticate
///
/// The token gate. The `authorization` header carries the raw token; a `Bearer `
/// prefix is tolerated.
///
/// - no header, or an empty one: `Unauthenticated` (401)
/// - anything else that does not verify, including non-UTF-8 or blank values: `Forbidden` (403)
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthUser, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated(MISSING_HEADER_MESSAGE.to_string()))?;

    let forbidden = || ApiError::Forbidden(NOT_LOGGED_IN_MESSAGE.to_string());

    let Ok(raw) = value.to_str() else {
        tracing::debug!("authorization header is not valid UTF-8");
        return Err(forbidden());
    };

    let raw = raw.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);

    match tokens.verify(token) {
        Ok(claims) => Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "rejected identity token");
            Err(forbidden())
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Reads the identity attached by `auth_middleware`. When the middleware did not run
/// (a handler mounted outside the authenticated router) the header is verified here.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let tokens = TokenService::from_ref(state);
        authenticate(&parts.headers, &tokens)
    }
}
