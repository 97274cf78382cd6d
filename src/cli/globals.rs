use secrecy::SecretString;

/// Process-wide configuration assembled once at startup and passed down
/// explicitly; nothing reads ambient state after this is built.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Symmetric key signing and verifying every bearer token for the
    /// process lifetime. Never rotated while running.
    pub secret: SecretString,
    pub token_ttl_seconds: i64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(secret: SecretString, token_ttl_seconds: i64) -> Self {
        Self {
            secret,
            token_ttl_seconds,
        }
    }
}
