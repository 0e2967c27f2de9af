/*
 * Responsibility
 * - リクエストが public かどうか / 解決済み caller_id, client_id の参照 (読み取り専用)
 * - access_token を query から取り出し、TokenResolver で identity に解決する
 * - 解決結果を X-Caller-Id / X-Client-Id と AuthCtx (extensions) に書き込む
 *
 * Notes
 * - 受信した X-Caller-Id / X-Client-Id は信用しない。解決前に必ず消す
 * - リモートが 404 (未知のトークン) の場合はエラーにせず匿名リクエストとして通す
 * - ログは出さない (呼び出し側 middleware の責務)
 */
use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Uri};
use tokio::time::Instant;

use crate::error::AppError;
use crate::services::oauth::resolver::{ResolveError, ResolveResult, TokenResolver};
use crate::services::oauth::types::{AccessToken, AuthCtx};

pub const X_PUBLIC: HeaderName = HeaderName::from_static("x-public");
pub const X_CALLER_ID: HeaderName = HeaderName::from_static("x-caller-id");
pub const X_CLIENT_ID: HeaderName = HeaderName::from_static("x-client-id");

const ACCESS_TOKEN_PARAM: &str = "access_token";

/// リクエスト全体の締め切り
///
/// extensions に入っていれば、トークン解決は resolver の timeout と
/// この締め切りの早い方で打ち切られる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDeadline(pub Instant);

/// `X-Public` が厳密に `"true"` のときだけ public。リクエストが無い場合も public。
pub fn is_public(headers: Option<&HeaderMap>) -> bool {
    let Some(headers) = headers else {
        return true;
    };
    headers
        .get(X_PUBLIC)
        .is_some_and(|v| v.as_bytes() == b"true")
}

pub fn client_id(headers: Option<&HeaderMap>) -> i64 {
    header_i64(headers, X_CLIENT_ID)
}

pub fn caller_id(headers: Option<&HeaderMap>) -> i64 {
    header_i64(headers, X_CALLER_ID)
}

// 無い・数値でない場合は 0
fn header_i64(headers: Option<&HeaderMap>, key: HeaderName) -> i64 {
    headers
        .and_then(|h| h.get(key))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

#[derive(Clone)]
pub struct Authenticator {
    resolver: Arc<dyn TokenResolver>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("resolver", &self.resolver.backend_name())
            .finish()
    }
}

impl Authenticator {
    pub fn new(resolver: Arc<dyn TokenResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve the request's `access_token` and stamp the identity on it.
    ///
    /// - `None` is accepted as "nothing to authenticate".
    /// - Inbound identity markers (headers and `AuthCtx`) are always removed first.
    /// - A token unknown to the authorization service leaves the request anonymous.
    ///
    /// Any returned error means the caller must stop handling the request.
    pub async fn authenticate_request<B>(
        &self,
        request: Option<&mut Request<B>>,
    ) -> Result<(), AppError> {
        let Some(request) = request else {
            return Ok(());
        };
        clean_request(request);

        let token_id = access_token_param(request.uri()).unwrap_or_default();
        let token_id = token_id.trim();
        if token_id.is_empty() {
            return Err(AppError::bad_request("access_token is required"));
        }

        let deadline = request.extensions().get::<RequestDeadline>().copied();

        let at = match self.lookup(token_id, deadline).await {
            Ok(at) => at,
            Err(ResolveError::NotFound) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        stamp_request(request, at);
        Ok(())
    }

    async fn lookup(
        &self,
        token_id: &str,
        deadline: Option<RequestDeadline>,
    ) -> ResolveResult<AccessToken> {
        let resolve = self.resolver.resolve(token_id);

        match deadline {
            Some(RequestDeadline(at)) => tokio::time::timeout_at(at, resolve)
                .await
                .unwrap_or_else(|_elapsed| {
                    Err(ResolveError::InvalidParameters(
                        "request deadline exceeded".into(),
                    ))
                }),
            None => resolve.await,
        }
    }
}

fn clean_request<B>(request: &mut Request<B>) {
    let headers = request.headers_mut();
    headers.remove(X_CLIENT_ID);
    headers.remove(X_CALLER_ID);
    request.extensions_mut().remove::<AuthCtx>();
}

fn stamp_request<B>(request: &mut Request<B>, at: AccessToken) {
    let headers = request.headers_mut();
    headers.insert(X_CALLER_ID, HeaderValue::from(at.caller_id));
    headers.insert(X_CLIENT_ID, HeaderValue::from(at.client_id));
    request.extensions_mut().insert(AuthCtx::from(at));
}

// 最初に現れた access_token を返す (form-urlencoded としてデコード)
fn access_token_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == ACCESS_TOKEN_PARAM)
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::StatusCode;

    use super::*;

    enum Outcome {
        Token(AccessToken),
        NotFound,
        Rejected(&'static str),
        Garbage,
        Slow(Duration),
    }

    struct FakeResolver {
        outcome: Outcome,
        seen: Mutex<Vec<String>>,
    }

    impl FakeResolver {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenResolver for FakeResolver {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn resolve(&self, token_id: &str) -> ResolveResult<AccessToken> {
            self.seen.lock().unwrap().push(token_id.to_string());
            match &self.outcome {
                Outcome::Token(at) => Ok(at.clone()),
                Outcome::NotFound => Err(ResolveError::NotFound),
                Outcome::Rejected(message) => Err(ResolveError::Rejected {
                    status: StatusCode::BAD_REQUEST,
                    message: message.to_string(),
                }),
                Outcome::Garbage => Err(ResolveError::Decode(
                    serde_json::from_slice::<AccessToken>(b"oops").unwrap_err(),
                )),
                Outcome::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Err(ResolveError::NotFound)
                }
            }
        }
    }

    fn token(client_id: i64, caller_id: i64) -> AccessToken {
        AccessToken {
            id: "abc".into(),
            client_id,
            caller_id,
        }
    }

    fn forged_request(uri: &str) -> Request<()> {
        let mut req = Request::builder()
            .uri(uri)
            .header("X-Caller-Id", "999")
            .header("X-Client-Id", "888")
            .body(())
            .unwrap();
        req.extensions_mut().insert(AuthCtx {
            caller_id: 999,
            client_id: 888,
            token_id: "forged".into(),
        });
        req
    }

    fn assert_unmarked(req: &Request<()>) {
        assert!(req.headers().get(X_CALLER_ID).is_none());
        assert!(req.headers().get(X_CLIENT_ID).is_none());
        assert!(req.extensions().get::<AuthCtx>().is_none());
    }

    #[test]
    fn missing_request_is_public_and_anonymous() {
        assert!(is_public(None));
        assert_eq!(client_id(None), 0);
        assert_eq!(caller_id(None), 0);
    }

    #[test]
    fn only_exact_true_marks_public() {
        let mut headers = HeaderMap::new();
        assert!(!is_public(Some(&headers)));

        for value in ["TRUE", "True", "1", "yes", " true"] {
            headers.insert(X_PUBLIC, HeaderValue::from_static(value));
            assert!(!is_public(Some(&headers)), "{value:?} must not be public");
        }

        headers.insert(X_PUBLIC, HeaderValue::from_static("true"));
        assert!(is_public(Some(&headers)));
    }

    #[test]
    fn unparseable_ids_read_as_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(X_CALLER_ID, HeaderValue::from_static("abc"));
        headers.insert(X_CLIENT_ID, HeaderValue::from_static("99999999999999999999"));
        assert_eq!(caller_id(Some(&headers)), 0);
        assert_eq!(client_id(Some(&headers)), 0);

        headers.insert(X_CALLER_ID, HeaderValue::from_static("-42"));
        headers.insert(X_CLIENT_ID, HeaderValue::from_static("7"));
        assert_eq!(caller_id(Some(&headers)), -42);
        assert_eq!(client_id(Some(&headers)), 7);
    }

    #[tokio::test]
    async fn missing_request_authenticates_trivially() {
        let resolver = FakeResolver::new(Outcome::NotFound);
        let auth = Authenticator::new(resolver.clone());

        auth.authenticate_request::<()>(None).await.unwrap();
        assert!(resolver.seen().is_empty());
    }

    #[tokio::test]
    async fn blank_token_is_rejected_after_erasing_markers() {
        for uri in ["/items", "/items?access_token=", "/items?access_token=%20%20"] {
            let resolver = FakeResolver::new(Outcome::Token(token(1, 2)));
            let auth = Authenticator::new(resolver.clone());
            let mut req = forged_request(uri);

            let err = auth.authenticate_request(Some(&mut req)).await.unwrap_err();

            assert!(matches!(err, AppError::BadRequest(ref m) if m == "access_token is required"));
            assert_unmarked(&req);
            assert!(resolver.seen().is_empty());
        }
    }

    #[tokio::test]
    async fn resolved_token_stamps_identity() {
        let resolver = FakeResolver::new(Outcome::Token(token(55, 100)));
        let auth = Authenticator::new(resolver.clone());
        let mut req = forged_request("/items?access_token=%20abc%20");

        auth.authenticate_request(Some(&mut req)).await.unwrap();

        assert_eq!(resolver.seen(), vec!["abc".to_string()]);
        assert_eq!(client_id(Some(req.headers())), 55);
        assert_eq!(caller_id(Some(req.headers())), 100);
        assert_eq!(req.headers().get_all(X_CALLER_ID).iter().count(), 1);
        assert_eq!(
            req.extensions().get::<AuthCtx>(),
            Some(&AuthCtx {
                caller_id: 100,
                client_id: 55,
                token_id: "abc".into(),
            })
        );
    }

    #[tokio::test]
    async fn first_access_token_wins() {
        let resolver = FakeResolver::new(Outcome::Token(token(1, 2)));
        let auth = Authenticator::new(resolver.clone());
        let mut req = forged_request("/items?access_token=first&access_token=second");

        auth.authenticate_request(Some(&mut req)).await.unwrap();
        assert_eq!(resolver.seen(), vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn unknown_token_passes_as_anonymous() {
        let auth = Authenticator::new(FakeResolver::new(Outcome::NotFound));
        let mut req = forged_request("/items?access_token=abc");

        auth.authenticate_request(Some(&mut req)).await.unwrap();
        assert_unmarked(&req);
    }

    #[tokio::test]
    async fn rejected_token_surfaces_external_service_error() {
        let auth = Authenticator::new(FakeResolver::new(Outcome::Rejected("invalid token")));
        let mut req = forged_request("/items?access_token=abc");

        let err = auth.authenticate_request(Some(&mut req)).await.unwrap_err();

        assert!(matches!(err, AppError::ExternalService { .. }));
        assert!(err.to_string().contains("invalid token"));
        assert_unmarked(&req);
    }

    #[tokio::test]
    async fn undecodable_response_is_internal_error() {
        let auth = Authenticator::new(FakeResolver::new(Outcome::Garbage));
        let mut req = forged_request("/items?access_token=abc");

        let err = auth.authenticate_request(Some(&mut req)).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_unmarked(&req);
    }

    #[tokio::test]
    async fn request_deadline_bounds_the_lookup() {
        let auth = Authenticator::new(FakeResolver::new(Outcome::Slow(Duration::from_secs(5))));
        let mut req = forged_request("/items?access_token=abc");
        req.extensions_mut().insert(RequestDeadline(
            Instant::now() + Duration::from_millis(20),
        ));

        let started = std::time::Instant::now();
        let err = auth.authenticate_request(Some(&mut req)).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_unmarked(&req);
    }
}
