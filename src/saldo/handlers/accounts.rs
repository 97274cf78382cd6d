use crate::{
    auth::{self, AccountId},
    saldo::{
        handlers::{normalize_email, valid_email, valid_password},
        storage::{self, InsertOutcome, UpdateOutcome},
    },
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateAccount {
    email: String,
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountCreated {
    pub id: Uuid,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UpdateAccount {
    email: Option<String>,
    password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/accounts",
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Account created", body = AccountCreated),
        (status = 400, description = "Invalid payload", body = String),
        (status = 409, description = "Email already registered", body = String),
        (status = 500, description = "Signup failed", body = String)
    ),
    tag = "accounts"
)]
#[instrument(skip(pool, payload))]
pub async fn create(
    pool: Extension<PgPool>,
    payload: Option<Json<CreateAccount>>,
) -> impl IntoResponse {
    let request: CreateAccount = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let password_hash = match auth::hash_password(&request.password).await {
        Ok(hash) => hash,
        Err(err) => {
            error!("Signup hashing failed: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signup failed".to_string(),
            )
                .into_response();
        }
    };

    match storage::insert_account(&pool, &email, &password_hash).await {
        Ok(InsertOutcome::Created(id)) => {
            (StatusCode::CREATED, Json(AccountCreated { id })).into_response()
        }
        Ok(InsertOutcome::DuplicateEmail) => (
            StatusCode::CONFLICT,
            "Email already registered".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Signup failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signup failed".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/accounts/me",
    responses(
        (status = 200, description = "Account profile", body = storage::AccountProfile),
        (status = 401, description = "Unauthorized", body = String),
        (status = 404, description = "Account not found", body = String)
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
#[instrument(skip(pool))]
pub async fn me(pool: Extension<PgPool>, account: Extension<AccountId>) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    match storage::fetch_account(&pool, account_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to fetch account: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch account".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/accounts/me",
    request_body = UpdateAccount,
    responses(
        (status = 204, description = "Account updated"),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Unauthorized", body = String),
        (status = 404, description = "Account not found", body = String),
        (status = 409, description = "Email already registered", body = String)
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
#[instrument(skip(pool, payload))]
pub async fn update(
    pool: Extension<PgPool>,
    account: Extension<AccountId>,
    payload: Option<Json<UpdateAccount>>,
) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    let request: UpdateAccount = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.email.is_none() && request.password.is_none() {
        return (StatusCode::BAD_REQUEST, "Nothing to update".to_string()).into_response();
    }

    let email = request.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        if !valid_email(email) {
            return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
        }
    }

    // A password change supersedes the stored hash; the old one is gone.
    let password_hash = match &request.password {
        Some(password) => {
            if !valid_password(password) {
                return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
            }
            match auth::hash_password(password).await {
                Ok(hash) => Some(hash),
                Err(err) => {
                    error!("Password update hashing failed: {err:#}");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Update failed".to_string(),
                    )
                        .into_response();
                }
            }
        }
        None => None,
    };

    match storage::update_account(&pool, account_id, email.as_deref(), password_hash.as_deref())
        .await
    {
        Ok(UpdateOutcome::Updated) => StatusCode::NO_CONTENT.into_response(),
        Ok(UpdateOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response()
        }
        Ok(UpdateOutcome::DuplicateEmail) => (
            StatusCode::CONFLICT,
            "Email already registered".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Account update failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Update failed".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/accounts/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized", body = String),
        (status = 404, description = "Account not found", body = String)
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
#[instrument(skip(pool))]
pub async fn remove(pool: Extension<PgPool>, account: Extension<AccountId>) -> impl IntoResponse {
    let AccountId(account_id) = *account;

    match storage::delete_account(&pool, account_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response(),
        Err(err) => {
            error!("Account delete failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Delete failed".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_account_defaults_to_no_changes() {
        let request = UpdateAccount::default();
        assert!(request.email.is_none());
        assert!(request.password.is_none());
    }

    #[test]
    fn account_created_serializes_id() -> Result<(), serde_json::Error> {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(AccountCreated { id })?;
        assert_eq!(value["id"], id.to_string());
        Ok(())
    }
}
