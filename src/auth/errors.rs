//! Error taxonomy shared across the authentication core.

use crate::auth::token::TokenError;
use axum::http::StatusCode;
use thiserror::Error;

/// Failures the authentication core reports to the request layer.
///
/// `InvalidCredentials` covers both an unknown account and a wrong password
/// so callers cannot enumerate accounts. `Unauthorized` keeps the underlying
/// token failure for server-side diagnostics; at the HTTP boundary all three
/// kinds collapse into one unauthorized response. `Internal` wraps primitive
/// or infrastructure failures and is never detailed to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] TokenError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal detail stays in the server logs.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials | Self::Unauthorized(_) => "Unauthorized",
            Self::Internal(_) => "Internal server error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn expected_failures_map_to_unauthorized() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unauthorized(TokenError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unauthorized(TokenError::BadSignature).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unauthorized(TokenError::Malformed).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn internal_failures_stay_generic_for_clients() {
        let err = AuthError::Internal(anyhow!("bcrypt parameters: cost=10"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
        assert!(!err.public_message().contains("cost"));
    }

    #[test]
    fn unknown_account_and_wrong_password_share_one_shape() {
        let unknown = AuthError::InvalidCredentials;
        let wrong = AuthError::InvalidCredentials;
        assert_eq!(unknown.status(), wrong.status());
        assert_eq!(unknown.public_message(), wrong.public_message());
    }
}
