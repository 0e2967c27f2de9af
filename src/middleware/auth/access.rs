//! access_token (query) を OAuth サービスで解決 → X-Caller-Id / X-Client-Id と AuthCtx を載せる
//!
//! - 解決できなかったリクエスト (未知のトークン) は匿名のまま handler に渡す
//! - 「認証必須」の判断は handler 側 (AuthCtxExtractor / is_public) で行う

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::oauth::{self, AuthCtx};
use crate::state::AppState;

/// `/api/v1/*` に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(err) = state.auth.authenticate_request(Some(&mut req)).await {
        tracing::warn!(
            error = %err,
            status = %err.status(),
            path = %req.uri().path(),
            "request authentication failed"
        );
        return Err(err);
    }

    match req.extensions().get::<AuthCtx>() {
        Some(ctx) => tracing::debug!(
            caller_id = ctx.caller_id,
            client_id = ctx.client_id,
            "request authenticated"
        ),
        None => tracing::debug!(
            public = oauth::is_public(Some(req.headers())),
            "access token unknown, continuing as anonymous"
        ),
    }

    Ok(next.run(req).await)
}
