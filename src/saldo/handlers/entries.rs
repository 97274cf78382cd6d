use crate::{
    auth::AccountId,
    saldo::storage::{self, LedgerEntry},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const DESCRIPTION_MAX_LENGTH: usize = 256;
const ENTRY_KINDS: [&str; 2] = ["income", "expense"];

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EntryPayload {
    description: String,
    amount_cents: i64,
    kind: String,
}

struct ValidEntry {
    description: String,
    amount_cents: i64,
    kind: String,
}

fn validate_payload(payload: EntryPayload) -> Result<ValidEntry, String> {
    let description = payload.description.trim().to_string();
    if description.is_empty() || description.len() > DESCRIPTION_MAX_LENGTH {
        return Err("Invalid description".to_string());
    }

    if payload.amount_cents <= 0 {
        return Err("Amount must be positive".to_string());
    }

    if !ENTRY_KINDS.contains(&payload.kind.as_str()) {
        return Err("Kind must be income or expense".to_string());
    }

    Ok(ValidEntry {
        description,
        amount_cents: payload.amount_cents,
        kind: payload.kind,
    })
}

#[utoipa::path(
    post,
    path = "/v1/entries",
    request_body = EntryPayload,
    responses(
        (status = 201, description = "Entry created", body = LedgerEntry),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Unauthorized", body = String)
    ),
    security(("bearer" = [])),
    tag = "entries"
)]
#[instrument(skip(pool, payload))]
pub async fn create(
    pool: Extension<PgPool>,
    account: Extension<AccountId>,
    payload: Option<Json<EntryPayload>>,
) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    let request: EntryPayload = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let entry = match validate_payload(request) {
        Ok(entry) => entry,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    // Every entry is bound to the caller decoded from the token; the payload
    // carries no owner field to spoof.
    match storage::insert_entry(
        &pool,
        account_id,
        &entry.description,
        entry.amount_cents,
        &entry.kind,
    )
    .await
    {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => {
            error!("Failed to insert entry: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create entry".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/entries",
    responses(
        (status = 200, description = "Entries owned by the caller", body = [LedgerEntry]),
        (status = 401, description = "Unauthorized", body = String)
    ),
    security(("bearer" = [])),
    tag = "entries"
)]
#[instrument(skip(pool))]
pub async fn list(pool: Extension<PgPool>, account: Extension<AccountId>) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    match storage::list_entries(&pool, account_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => {
            error!("Failed to list entries: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list entries".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry", body = LedgerEntry),
        (status = 401, description = "Unauthorized", body = String),
        (status = 404, description = "Entry not found", body = String)
    ),
    security(("bearer" = [])),
    tag = "entries"
)]
#[instrument(skip(pool))]
pub async fn fetch(
    pool: Extension<PgPool>,
    account: Extension<AccountId>,
    Path(entry_id): Path<Uuid>,
) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    match storage::fetch_entry(&pool, account_id, entry_id).await {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        // Another account's entry is indistinguishable from a missing one.
        Ok(None) => (StatusCode::NOT_FOUND, "Entry not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to fetch entry: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch entry".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    request_body = EntryPayload,
    responses(
        (status = 200, description = "Updated entry", body = LedgerEntry),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Unauthorized", body = String),
        (status = 404, description = "Entry not found", body = String)
    ),
    security(("bearer" = [])),
    tag = "entries"
)]
#[instrument(skip(pool, payload))]
pub async fn update(
    pool: Extension<PgPool>,
    account: Extension<AccountId>,
    Path(entry_id): Path<Uuid>,
    payload: Option<Json<EntryPayload>>,
) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    let request: EntryPayload = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let entry = match validate_payload(request) {
        Ok(entry) => entry,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    match storage::update_entry(
        &pool,
        account_id,
        entry_id,
        &entry.description,
        entry.amount_cents,
        &entry.kind,
    )
    .await
    {
        Ok(Some(updated)) => (StatusCode::OK, Json(updated)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Entry not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to update entry: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update entry".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Unauthorized", body = String),
        (status = 404, description = "Entry not found", body = String)
    ),
    security(("bearer" = [])),
    tag = "entries"
)]
#[instrument(skip(pool))]
pub async fn remove(
    pool: Extension<PgPool>,
    account: Extension<AccountId>,
    Path(entry_id): Path<Uuid>,
) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    match storage::delete_entry(&pool, account_id, entry_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Entry not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to delete entry: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete entry".to_string(),
            )
                .into_response()
        }
    }
}
