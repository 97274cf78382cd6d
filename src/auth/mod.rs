//! Authentication core: credential hashing, token issuance/validation, and
//! the login/authorize flows built on top of them.
//!
//! - **`password`** - bcrypt hashing and verification, the only code that
//!   sees plaintext passwords
//! - **`token`** - HS256 bearer tokens signed with the process secret
//! - **`service`** - `login` and `authorize` composing the two, plus the
//!   account lookup seam the storage layer implements
//! - **`errors`** - the failure taxonomy shared with the request layer
//! - **`middleware`** - the bearer-auth stage protecting ledger routes

pub mod errors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

pub use errors::AuthError;
pub use middleware::AccountId;
pub use service::{authorize, hash_password, login, AccountStore, Session, StoredAccount};
pub use token::{TokenError, TokenSigner, DEFAULT_TOKEN_TTL_SECONDS};
