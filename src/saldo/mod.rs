use crate::{
    auth::{middleware::require_account, TokenSigner},
    cli::globals::GlobalArgs,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

pub mod handlers;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::login::login,
        handlers::accounts::create,
        handlers::accounts::me,
        handlers::accounts::update,
        handlers::accounts::remove,
        handlers::entries::create,
        handlers::entries::list,
        handlers::entries::fetch,
        handlers::entries::update,
        handlers::entries::remove,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::login::UserLogin,
        handlers::login::LoginResponse,
        handlers::accounts::CreateAccount,
        handlers::accounts::AccountCreated,
        handlers::accounts::UpdateAccount,
        handlers::entries::EntryPayload,
        storage::AccountProfile,
        storage::LedgerEntry,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "saldo", description = "Account-scoped ledger API"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: GlobalArgs) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    // The signer is built once from the process secret and shared read-only
    // by every request; no other auth state exists.
    let signer = Arc::new(TokenSigner::new(&globals.secret));

    let app = router(pool, signer, globals);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Build the application router around the shared pool and token signer.
///
/// The middleware pipeline is an explicit ordered set of stages: request-id
/// set/propagate, tracing, CORS, then shared state. Ledger and account-self
/// routes additionally pass the bearer-auth stage, which rejects the request
/// outright on any token failure.
#[must_use]
pub fn router(pool: PgPool, signer: Arc<TokenSigner>, globals: GlobalArgs) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    let protected = Router::new()
        .route(
            "/v1/accounts/me",
            get(handlers::accounts::me)
                .put(handlers::accounts::update)
                .delete(handlers::accounts::remove),
        )
        .route(
            "/v1/entries",
            get(handlers::entries::list).post(handlers::entries::create),
        )
        .route(
            "/v1/entries/:id",
            get(handlers::entries::fetch)
                .put(handlers::entries::update)
                .delete(handlers::entries::remove),
        )
        .route_layer(axum_middleware::from_fn(require_account));

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/v1/accounts", post(handlers::accounts::create))
        .route("/v1/login", post(handlers::login::login))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(signer))
                .layer(Extension(globals))
                .layer(Extension(pool.clone())),
        )
        .route("/health", get(handlers::health::health).options(handlers::health::health))
        .layer(Extension(pool))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
