//! Login and authorization flows composing the credential adapter, the token
//! signer, and the account lookup supplied by the storage layer.

use crate::auth::{errors::AuthError, password, token::TokenSigner};
use anyhow::Result;
use std::{future::Future, pin::Pin};
use tokio::task;
use uuid::Uuid;

/// Account row as the authentication core sees it: the identifier plus the
/// stored credential hash, nothing else.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub id: Uuid,
    pub password_hash: String,
}

/// Successful login outcome handed back to the request layer.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_id: Uuid,
    pub token: String,
}

/// Account lookup seam. The storage layer implements this for `PgPool`;
/// tests swap in an in-memory map.
pub trait AccountStore {
    /// Look up an account by its identifying key. "Not found" is a distinct
    /// outcome (`Ok(None)`), never an error.
    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StoredAccount>>> + Send + 'a>>;
}

/// Verify credentials and issue a token bound to the account.
///
/// bcrypt verification is CPU-bound and deliberately slow, so it runs on the
/// blocking pool rather than stalling the async executor.
///
/// # Errors
///
/// `InvalidCredentials` for an unknown key or a wrong password (the two are
/// indistinguishable to the caller), `Internal` for lookup, hashing, or
/// signing failures.
pub async fn login<S: AccountStore>(
    store: &S,
    signer: &TokenSigner,
    email: &str,
    password_plaintext: &str,
    ttl_seconds: i64,
) -> Result<Session, AuthError> {
    let account = store
        .find_by_email(email)
        .await
        .map_err(AuthError::Internal)?;

    let Some(account) = account else {
        return Err(AuthError::InvalidCredentials);
    };

    let candidate = password_plaintext.to_string();
    let stored_hash = account.password_hash.clone();
    let matched = task::spawn_blocking(move || password::verify(&candidate, &stored_hash))
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    if !matched {
        return Err(AuthError::InvalidCredentials);
    }

    let token = signer
        .issue(account.id, ttl_seconds)
        .map_err(AuthError::Internal)?;

    Ok(Session {
        account_id: account.id,
        token,
    })
}

/// Resolve a presented bearer token into the account id it was issued for.
///
/// # Errors
///
/// `Unauthorized` wrapping the specific token failure; the request layer
/// collapses all of them into one unauthorized response.
pub fn authorize(signer: &TokenSigner, token: &str) -> Result<Uuid, AuthError> {
    signer.validate(token).map_err(AuthError::from)
}

/// Hash a plaintext password on the blocking pool.
///
/// # Errors
///
/// `Internal` if the hashing primitive fails or the blocking task dies.
pub async fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let plaintext = plaintext.to_string();
    task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|err| AuthError::Internal(err.into()))?
        .map_err(AuthError::Internal)
}
