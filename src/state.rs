/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: auth: Authenticator (OAuth 接続設定 + HTTP client)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::oauth::Authenticator;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(auth: Arc<Authenticator>) -> Self {
        Self { auth }
    }
}
