/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, OAuth サービスの接続先、タイムアウトなど)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_OAUTH_BASE_URL: &str = "http://localhost:8089";
pub const DEFAULT_OAUTH_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// OAuth (access token lookup) サービスへの接続設定
///
/// `AppState` 経由で注入する。テストでは別の base URL / timeout を渡す。
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl OAuthConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)?;
        if timeout.is_zero() {
            return Err(ConfigError::Invalid("OAUTH_TIMEOUT_MS"));
        }
        Ok(Self { base_url, timeout })
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub oauth: OAuthConfig,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let oauth_base_url = std::env::var("OAUTH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OAUTH_BASE_URL.to_string());

        let oauth_timeout_ms = match std::env::var("OAUTH_TIMEOUT_MS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("OAUTH_TIMEOUT_MS"))?,
            Err(_) => DEFAULT_OAUTH_TIMEOUT_MS,
        };

        let oauth = OAuthConfig::new(
            &oauth_base_url,
            Duration::from_millis(oauth_timeout_ms),
        )?;

        let request_timeout =
            parse_request_timeout(std::env::var("REQUEST_TIMEOUT_SECONDS").ok().as_deref())?;

        let request_body_limit_bytes = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            oauth,
            request_timeout,
            request_body_limit_bytes,
        })
    }
}

// 0 (全リクエストが即タイムアウト) と上限超え (締め切り計算が溢れる) は起動時に拒否する
fn parse_request_timeout(raw: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_REQUEST_TIMEOUT_SECONDS).contains(&secs) => {
            Ok(Duration::from_secs(secs))
        }
        _ => Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS")),
    }
}

// base URL の末尾にパスセグメントを足していくので cannot-be-a-base は拒否する
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid("OAUTH_BASE_URL"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("OAUTH_BASE_URL"));
    }
    Ok(url)
}
