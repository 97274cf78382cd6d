//! Database access for accounts and ledger entries.
//!
//! Every query that touches entries is scoped by `account_id` in SQL, so a
//! caller can only ever reach rows owned by the account its token resolved
//! to. Account lookup misses are `Ok(None)`, never errors.

use crate::auth::{AccountStore, StoredAccount};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::{future::Future, pin::Pin};
use tracing::{info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of inserting a row guarded by a unique constraint.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(Uuid),
    DuplicateEmail,
}

/// Outcome of an account update, which can trip the email unique constraint.
#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    DuplicateEmail,
    NotFound,
}

pub async fn insert_account(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<InsertOutcome> {
    let query = "INSERT INTO accounts (email, password_hash) VALUES ($1, $2) RETURNING id";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::DuplicateEmail),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

pub async fn find_account_by_email(pool: &PgPool, email: &str) -> Result<Option<StoredAccount>> {
    let query = "SELECT id, password_hash FROM accounts WHERE email = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;

    Ok(row.map(|row| StoredAccount {
        id: row.get("id"),
        password_hash: row.get("password_hash"),
    }))
}

impl AccountStore for PgPool {
    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StoredAccount>>> + Send + 'a>> {
        Box::pin(find_account_by_email(self, email))
    }
}

pub async fn fetch_account(pool: &PgPool, account_id: Uuid) -> Result<Option<AccountProfile>> {
    let query = "SELECT id, email, created_at FROM accounts WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account")?;

    Ok(row.map(|row| AccountProfile {
        id: row.get("id"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }))
}

pub async fn update_account(
    pool: &PgPool,
    account_id: Uuid,
    email: Option<&str>,
    password_hash: Option<&str>,
) -> Result<UpdateOutcome> {
    let query = r"
        UPDATE accounts
        SET email = COALESCE($2, email),
            password_hash = COALESCE($3, password_hash)
        WHERE id = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(account_id)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(done) if done.rows_affected() > 0 => Ok(UpdateOutcome::Updated),
        Ok(_) => Ok(UpdateOutcome::NotFound),
        Err(err) if is_unique_violation(&err) => Ok(UpdateOutcome::DuplicateEmail),
        Err(err) => Err(err).context("failed to update account"),
    }
}

pub async fn delete_account(pool: &PgPool, account_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM accounts WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let done = sqlx::query(query)
        .bind(account_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete account")?;

    Ok(done.rows_affected() > 0)
}

pub async fn insert_entry(
    pool: &PgPool,
    account_id: Uuid,
    description: &str,
    amount_cents: i64,
    kind: &str,
) -> Result<LedgerEntry> {
    let query = r"
        INSERT INTO entries (account_id, description, amount_cents, kind)
        VALUES ($1, $2, $3, $4)
        RETURNING id, account_id, description, amount_cents, kind, created_at
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .bind(description)
        .bind(amount_cents)
        .bind(kind)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert ledger entry")?;

    Ok(entry_from_row(&row))
}

pub async fn list_entries(pool: &PgPool, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
    let query = r"
        SELECT id, account_id, description, amount_cents, kind, created_at
        FROM entries
        WHERE account_id = $1
        ORDER BY created_at DESC
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(account_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list ledger entries")?;

    Ok(rows.iter().map(entry_from_row).collect())
}

pub async fn fetch_entry(
    pool: &PgPool,
    account_id: Uuid,
    entry_id: Uuid,
) -> Result<Option<LedgerEntry>> {
    let query = r"
        SELECT id, account_id, description, amount_cents, kind, created_at
        FROM entries
        WHERE id = $1 AND account_id = $2
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(entry_id)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch ledger entry")?;

    Ok(row.as_ref().map(entry_from_row))
}

pub async fn update_entry(
    pool: &PgPool,
    account_id: Uuid,
    entry_id: Uuid,
    description: &str,
    amount_cents: i64,
    kind: &str,
) -> Result<Option<LedgerEntry>> {
    let query = r"
        UPDATE entries
        SET description = $3, amount_cents = $4, kind = $5
        WHERE id = $1 AND account_id = $2
        RETURNING id, account_id, description, amount_cents, kind, created_at
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(entry_id)
        .bind(account_id)
        .bind(description)
        .bind(amount_cents)
        .bind(kind)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update ledger entry")?;

    Ok(row.as_ref().map(entry_from_row))
}

pub async fn delete_entry(pool: &PgPool, account_id: Uuid, entry_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM entries WHERE id = $1 AND account_id = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let done = sqlx::query(query)
        .bind(entry_id)
        .bind(account_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete ledger entry")?;

    Ok(done.rows_affected() > 0)
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> LedgerEntry {
    LedgerEntry {
        id: row.get("id"),
        account_id: row.get("account_id"),
        description: row.get("description"),
        amount_cents: row.get("amount_cents"),
        kind: row.get("kind"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
