/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (HTTP 共通 / OAuth access token)
 * - axum::serve() で起動
 */
use std::{panic, process};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, v1::handlers::health::health};
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::oauth::build_authenticator;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,oauth_interceptor=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost".
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        oauth_base_url = %config.oauth.base_url,
        oauth_timeout_ms = config.oauth.timeout.as_millis() as u64,
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    // process-level の依存はここで作って AppState に注入する
    let auth = build_authenticator(config)?;
    Ok(AppState::new(auth))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let v1 = middleware::auth::access::apply(api::v1::routes(), state.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state);

    middleware::http::apply(router, config)
}
