/*
 * Responsibility
 * - GET /identity: middleware が解決した identity をそのまま返す (匿名なら 0)
 * - GET /callers/me: 認証必須。AuthCtx が無ければ 401
 */
use axum::{Json, http::HeaderMap};

use crate::api::v1::{
    dto::identity::{CallerResponse, IdentityResponse},
    extractors::AuthCtxExtractor,
};
use crate::services::oauth;

pub async fn identity(headers: HeaderMap) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        public: oauth::is_public(Some(&headers)),
        caller_id: oauth::caller_id(Some(&headers)),
        client_id: oauth::client_id(Some(&headers)),
    })
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<CallerResponse> {
    Json(CallerResponse {
        caller_id: ctx.caller_id,
        client_id: ctx.client_id,
    })
}
