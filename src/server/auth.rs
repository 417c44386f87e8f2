//! Bearer token authentication.

use super::response::ApiError;
use super::AppState;
use crate::error::AuthError;
use crate::token::Claims;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

/// Extractor that only succeeds for requests carrying a valid bearer token.
///
/// Runs before the body is read, so unauthenticated requests never reach
/// input validation or the prober.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?;

        let token = bearer_token(header)?;
        match state.verifier.verify(token) {
            Ok(claims) => Ok(Self(claims)),
            Err(e) => {
                debug!(error = %e, "rejected bearer token");
                Err(e.into())
            }
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` value.
fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token("bearer   abc").unwrap(), "abc");
    }

    #[test]
    fn test_bad_authorization_values() {
        for value in ["Bearer", "Bearer ", "Basic dXNlcjpwYXNz", "abc.def.ghi", ""] {
            assert!(
                matches!(bearer_token(value), Err(AuthError::MalformedHeader)),
                "{value:?} should be rejected"
            );
        }
    }
}
