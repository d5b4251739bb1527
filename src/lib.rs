pub mod auth;
pub mod cli;
pub mod config;
pub mod countdown;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::{routing::get, Router};
use sqlx::SqlitePool;
use time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::Level;

use crate::config::SiteConfig;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub site: Arc<SiteConfig>,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// `pool` must already be migrated; it also backs the admin session store,
/// whose table is created here.
pub async fn build_app(
    pool: SqlitePool,
    store: Store,
    site: SiteConfig,
    secure_cookies: bool,
) -> Result<Router, sqlx::Error> {
    let session_store = SqliteStore::new(pool);
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::hours(12)))
        .with_secure(secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let state = AppState {
        store: Arc::new(store),
        site: Arc::new(site),
    };

    Ok(Router::new()
        .route("/health", get(health))
        .merge(routes::invite::router())
        .merge(routes::admin::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state))
}
