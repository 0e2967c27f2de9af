/*
 * Responsibility
 * - OAuth サービスとやり取りする JSON の型 (AccessToken / RemoteError)
 * - 解決済み identity を handler に渡すための型 (AuthCtx)
 *
 * Notes
 * - AuthCtx は Authenticator だけが request extensions に insert する
 */
use serde::{Deserialize, Deserializer};

/// `GET /oauth/access_token/{id}` の成功レスポンス
///
/// 欠けたフィールドはゼロ値として扱う (リモート側の契約に合わせる)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "clientId", default)]
    pub client_id: i64,
    #[serde(rename = "callerId", default)]
    pub caller_id: i64,
}

/// 失敗レスポンス (status > 299) の body
///
/// 空の `causes` は `null` で届くので、欠落と同じく空として扱う
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub causes: Vec<serde_json::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `caller_id` / `client_id` は `X-Caller-Id` / `X-Client-Id` と同じ値
/// - `token_id` は監査/相関用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub caller_id: i64,
    pub client_id: i64,
    pub token_id: String,
}

impl From<AccessToken> for AuthCtx {
    fn from(at: AccessToken) -> Self {
        Self {
            caller_id: at.caller_id,
            client_id: at.client_id,
            token_id: at.id,
        }
    }
}
