/*
 * Responsibility
 * - /identity, /callers/me のレスポンス DTO
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub public: bool,
    pub caller_id: i64,
    pub client_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CallerResponse {
    pub caller_id: i64,
    pub client_id: i64,
}
