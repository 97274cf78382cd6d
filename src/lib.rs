//! saldo: account-scoped ledger service.
//!
//! The crate is split into the authentication core (`auth`), the HTTP
//! service and storage layer (`saldo`), and the CLI/bootstrap (`cli`).

pub mod auth;
pub mod cli;
pub mod saldo;
