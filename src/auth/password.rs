//! Password hashing and verification backed by bcrypt.
//!
//! This is the only module allowed to see plaintext passwords. Everything
//! else stores and passes around the self-describing bcrypt string
//! (`$2b$<cost>$<salt+digest>`), which carries its own cost factor and salt
//! so re-verification needs no external state.

use anyhow::{Context, Result};

/// bcrypt cost factor. Deliberately slow to resist offline brute force.
pub const HASH_COST: u32 = 10;

/// Hash a plaintext password with a fresh random salt.
///
/// Two calls on the same input produce different strings; both verify.
///
/// # Errors
///
/// Returns an error only on a hashing primitive failure, which callers
/// surface as an internal error.
pub fn hash(plaintext: &str) -> Result<String> {
    bcrypt::hash(plaintext, HASH_COST).context("failed to hash password")
}

/// Check a plaintext password against a stored bcrypt hash.
///
/// A wrong password is a normal `false`, not an error. A malformed stored
/// hash also yields `false` so it can never be mistaken for a match.
#[must_use]
pub fn verify(plaintext: &str, stored_hash: &str) -> bool {
    bcrypt::verify(plaintext, stored_hash).unwrap_or(false)
}
