/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証 middleware は app.rs で v1 全体に掛ける
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::identity::{identity, me};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/identity", get(identity))
        .route("/callers/me", get(me))
}
