use crate::{
    auth::{self, AuthError, TokenSigner},
    cli::globals::GlobalArgs,
    saldo::handlers::{normalize_email, valid_email, valid_password},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserLogin {
    email: String,
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub account_id: Uuid,
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = UserLogin,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Unauthorized", body = String),
        (status = 500, description = "Login failed", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip(pool, signer, globals, payload))]
pub async fn login(
    pool: Extension<PgPool>,
    signer: Extension<Arc<TokenSigner>>,
    globals: Extension<GlobalArgs>,
    payload: Option<Json<UserLogin>>,
) -> impl IntoResponse {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&user.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    if !valid_password(&user.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    match auth::login(
        &*pool,
        &signer,
        &email,
        &user.password,
        globals.token_ttl_seconds,
    )
    .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(LoginResponse {
                account_id: session.account_id,
                token: session.token,
            }),
        )
            .into_response(),

        // Unknown account and wrong password share this arm on purpose.
        Err(err @ (AuthError::InvalidCredentials | AuthError::Unauthorized(_))) => {
            debug!("Login rejected: {err}");
            (err.status(), err.public_message().to_string()).into_response()
        }

        Err(err @ AuthError::Internal(_)) => {
            error!("Login failed: {err:#}");
            (err.status(), err.public_message().to_string()).into_response()
        }
    }
}
