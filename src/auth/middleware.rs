//! Bearer-auth stage for protected routes.
//!
//! Runs after the request-id/trace/CORS stages and before any handler: it
//! extracts the bearer token, validates it, and injects the decoded account
//! id into the request extensions. Any token failure ends the request with
//! an unauthorized response; there is no degraded-trust fallback.

use crate::auth::{service, token::TokenSigner};
use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Account id decoded from the bearer token, available to handlers behind
/// this middleware via `Extension<AccountId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountId(pub Uuid);

pub async fn require_account(
    Extension(signer): Extension<Arc<TokenSigner>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    };

    match service::authorize(&signer, &token) {
        Ok(account_id) => {
            request.extensions_mut().insert(AccountId(account_id));
            next.run(request).await
        }
        Err(err) => {
            // Malformed, bad signature, and expired stay distinguishable in
            // the logs only; the response is the same for all three.
            debug!("Rejected bearer token: {err}");
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn bearer_token_trims_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   abc  "));
        assert_eq!(bearer_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn bearer_token_rejects_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_rejects_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
