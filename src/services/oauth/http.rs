use async_trait::async_trait;
use axum::http::StatusCode;
use url::Url;

use crate::config::OAuthConfig;
use crate::services::oauth::resolver::{ResolveError, ResolveResult, TokenResolver};
use crate::services::oauth::types::{AccessToken, RemoteError};

/// HTTP-backed token resolver.
///
/// One `GET {base_url}/oauth/access_token/{token_id}` per call. The client
/// timeout bounds the whole exchange (connect + headers + body).
#[derive(Clone, Debug)]
pub struct HttpTokenResolver {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTokenResolver {
    pub fn new(config: &OAuthConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn token_url(&self, token_id: &str) -> ResolveResult<Url> {
        let mut url = self.base_url.clone();
        // token_id は 1 セグメントとして percent-encode される ('/' を含んでもパスは増えない)
        url.path_segments_mut()
            .map_err(|_| ResolveError::InvalidParameters("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["oauth", "access_token", token_id]);
        Ok(url)
    }
}

#[async_trait]
impl TokenResolver for HttpTokenResolver {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn resolve(&self, token_id: &str) -> ResolveResult<AccessToken> {
        let url = self.token_url(token_id)?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolveError::InvalidParameters(e.to_string()))?;

        let status = resp.status();
        // 404 は body を読まずに確定させる (body の読み込み失敗で匿名扱いが崩れないように)
        if status == StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ResolveError::InvalidParameters(e.to_string()))?;

        classify(status, &body)
    }
}

/// Translate a raw `(status, body)` pair into an identity or a classified error.
pub(crate) fn classify(status: StatusCode, body: &[u8]) -> ResolveResult<AccessToken> {
    if status.as_u16() <= 299 {
        return serde_json::from_slice::<AccessToken>(body).map_err(ResolveError::Decode);
    }

    // 404 は body を見ずに「未知のトークン」とする
    if status == StatusCode::NOT_FOUND {
        return Err(ResolveError::NotFound);
    }

    let remote: RemoteError = serde_json::from_slice(body).map_err(ResolveError::Decode)?;

    Err(ResolveError::Rejected {
        status,
        message: remote.message,
    })
}
