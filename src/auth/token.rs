//! Bearer-token issuance and validation.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. The payload is
//! one canonical shape: `sub` carries the account id, `iat`/`exp` carry the
//! issue and expiry instants as unix seconds. A token is a stateless bearer
//! credential; possession plus a valid signature plus an unexpired payload is
//! the whole proof, and expiry is the only way a token dies.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Account id the token is bound to.
    pub sub: String,
    /// Issue instant, unix seconds.
    pub iat: i64,
    /// Expiry instant, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Signs and validates tokens with keys derived once from the process secret.
///
/// Both operations are pure and lock-free; a single instance is shared across
/// all requests behind an `Arc`.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a signed token for `account_id` expiring `ttl_seconds` from now.
    ///
    /// # Errors
    ///
    /// Returns an error only if the signing primitive fails.
    pub fn issue(&self, account_id: Uuid, ttl_seconds: i64) -> anyhow::Result<String> {
        self.issue_at(account_id, ttl_seconds, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        account_id: Uuid,
        ttl_seconds: i64,
        now_unix_seconds: i64,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now_unix_seconds,
            exp: now_unix_seconds + ttl_seconds,
        };

        // Header::default() is HS256, matching the decoding side.
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| anyhow::anyhow!("failed to sign token: {err}"))
    }

    /// Validate a token and return the account id it is bound to.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the token structure cannot be parsed,
    /// `BadSignature` if the signature does not verify (which also catches
    /// any payload tampering), and `Expired` once the expiry instant is
    /// reached.
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Same as [`validate`](Self::validate) against a caller-supplied clock.
    pub fn validate_at(&self, token: &str, now_unix_seconds: i64) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock, with no leeway.
        validation.validate_exp = false;

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if data.claims.exp <= now_unix_seconds {
            return Err(TokenError::Expired);
        }

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn signer() -> TokenSigner {
        TokenSigner::new(&SecretString::from("test-secret".to_string()))
    }

    #[test]
    fn issue_then_validate_returns_account_id() -> anyhow::Result<()> {
        let signer = signer();
        let account_id = Uuid::new_v4();

        let token = signer.issue_at(account_id, DEFAULT_TOKEN_TTL_SECONDS, NOW)?;
        let validated = signer.validate_at(&token, NOW + 1);

        assert_eq!(validated, Ok(account_id));
        Ok(())
    }

    #[test]
    fn same_inputs_issue_distinct_valid_tokens() -> anyhow::Result<()> {
        let signer = signer();
        let account_id = Uuid::new_v4();

        // Uniqueness comes from the timestamp, not a nonce.
        let first = signer.issue_at(account_id, DEFAULT_TOKEN_TTL_SECONDS, NOW)?;
        let second = signer.issue_at(account_id, DEFAULT_TOKEN_TTL_SECONDS, NOW + 1)?;

        assert_ne!(first, second);
        assert_eq!(signer.validate_at(&first, NOW + 2), Ok(account_id));
        assert_eq!(signer.validate_at(&second, NOW + 2), Ok(account_id));
        Ok(())
    }

    #[test]
    fn validate_rejects_at_or_past_expiry() -> anyhow::Result<()> {
        let signer = signer();
        let token = signer.issue_at(Uuid::new_v4(), 60, NOW)?;

        assert!(signer.validate_at(&token, NOW + 59).is_ok());
        assert_eq!(signer.validate_at(&token, NOW + 60), Err(TokenError::Expired));
        assert_eq!(signer.validate_at(&token, NOW + 61), Err(TokenError::Expired));
        Ok(())
    }

    #[test]
    fn validate_rejects_wrong_secret() -> anyhow::Result<()> {
        let token = signer().issue_at(Uuid::new_v4(), 60, NOW)?;
        let other = TokenSigner::new(&SecretString::from("other-secret".to_string()));

        assert_eq!(
            other.validate_at(&token, NOW + 1),
            Err(TokenError::BadSignature)
        );
        Ok(())
    }

    #[test]
    fn validate_rejects_garbage_as_malformed() {
        let signer = signer();
        assert_eq!(
            signer.validate_at("not-a-token", NOW),
            Err(TokenError::Malformed)
        );
        assert_eq!(signer.validate_at("", NOW), Err(TokenError::Malformed));
        assert_eq!(
            signer.validate_at("a.b.c.d", NOW),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn validate_rejects_non_uuid_subject() -> anyhow::Result<()> {
        let signer = signer();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: NOW,
            exp: NOW + 60,
        };
        let token = encode(&Header::default(), &claims, &signer.encoding)
            .map_err(|err| anyhow::anyhow!("encode failed: {err}"))?;

        assert_eq!(
            signer.validate_at(&token, NOW + 1),
            Err(TokenError::Malformed)
        );
        Ok(())
    }

    #[test]
    fn expired_wins_over_unexpired_claim_tampering() -> anyhow::Result<()> {
        // An expired token re-signed with the right key is Expired; an
        // expired token with a broken signature is BadSignature first.
        let signer = signer();
        let token = signer.issue_at(Uuid::new_v4(), 0, NOW)?;
        assert_eq!(signer.validate_at(&token, NOW), Err(TokenError::Expired));

        let mut broken = token;
        broken.pop();
        assert!(matches!(
            signer.validate_at(&broken, NOW),
            Err(TokenError::BadSignature | TokenError::Malformed)
        ));
        Ok(())
    }
}
