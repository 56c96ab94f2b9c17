//! Request context extraction: request IDs and caller identity.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use marquee_id::{RequestId, UserId};

use crate::api::error::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context available to every handler.
///
/// The request ID is taken from the `x-request-id` header when the caller
/// supplies one, otherwise a fresh one is generated. The user identity is
/// parsed from the `Authorization` header; requests without one are
/// anonymous.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: Option<UserId>,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| RequestId::new().to_string());

        let user_id = user_from_authorization_header(&parts.headers, &request_id)?;

        Ok(Self { request_id, user_id })
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse the caller's user ID out of a `Bearer user:<id>` token.
///
/// Tokens are opaque to route handlers; this is the only place that knows
/// their shape. Gateway-issued sessions present the bare account ID, so a
/// malformed token is a 401 rather than an anonymous downgrade.
fn user_from_authorization_header(
    headers: &HeaderMap,
    request_id: &str,
) -> Result<Option<UserId>, ApiError> {
    let Some(auth) = header_string(headers, AUTHORIZATION.as_str()) else {
        return Ok(None);
    };

    let Some(token) = auth.strip_prefix("Bearer ") else {
        return Err(ApiError::unauthorized(
            "invalid_authorization",
            "Authorization header must use the Bearer scheme",
        )
        .with_request_id(request_id.to_string()));
    };

    let Some(raw_user_id) = token.trim().strip_prefix("user:") else {
        return Err(ApiError::unauthorized(
            "invalid_token",
            "Bearer token must be in the form 'user:<user id>'",
        )
        .with_request_id(request_id.to_string()));
    };

    let user_id = raw_user_id.trim().parse::<UserId>().map_err(|_| {
        ApiError::unauthorized("invalid_token", "Bearer token does not carry a valid user ID")
            .with_request_id(request_id.to_string())
    })?;

    Ok(Some(user_id))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_authorization_is_anonymous() {
        let headers = HeaderMap::new();
        let user = user_from_authorization_header(&headers, "req-1").unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn bearer_user_token_parses() {
        let user_id = UserId::new();
        let headers = headers_with_auth(&format!("Bearer user:{user_id}"));
        let parsed = user_from_authorization_header(&headers, "req-1").unwrap();
        assert_eq!(parsed, Some(user_id));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        let err = user_from_authorization_header(&headers, "req-1").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.problem.code, "invalid_authorization");
    }

    #[test]
    fn bare_bearer_scheme_is_rejected() {
        let headers = headers_with_auth("Bearer   ");
        let err = user_from_authorization_header(&headers, "req-1").unwrap_err();
        assert_eq!(err.problem.code, "invalid_authorization");
    }

    #[test]
    fn malformed_user_id_is_rejected() {
        let headers = headers_with_auth("Bearer user:not-an-id");
        let err = user_from_authorization_header(&headers, "req-1").unwrap_err();
        assert_eq!(err.problem.code, "invalid_token");
    }

    #[test]
    fn wrong_id_prefix_is_rejected() {
        let headers = headers_with_auth("Bearer user:evt_01J8ZQG2N4X5Y6Z7A8B9C0D1E2");
        let err = user_from_authorization_header(&headers, "req-1").unwrap_err();
        assert_eq!(err.problem.code, "invalid_token");
    }
}
