/*
 * Responsibility
 * - アプリ共通の AppError 定義 (HTTP status + message を必ず持つ)
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - OAuth サービス呼び出しのエラー (ResolveError) を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::oauth::ResolveError;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// 外部サービスが明示的に拒否した (message はリモート側のものを埋め込む)
    #[error("{message}")]
    ExternalService {
        message: String,
        remote_status: StatusCode,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn external_service(message: impl Into<String>, remote_status: StatusCode) -> Self {
        Self::ExternalService {
            message: message.into(),
            remote_status,
        }
    }

    /// この error を返すときの HTTP status
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Internal { .. } => "INTERNAL_SERVER_ERROR",
            AppError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::InvalidParameters(_) => {
                AppError::bad_request("oauth service: invalid parameters")
            }
            ResolveError::Decode(err) => {
                AppError::internal("oauth service: could not parse oauth response", err)
            }
            ResolveError::Rejected { status, message } => {
                AppError::external_service(format!("oauth service: {message}"), status)
            }
            // 呼び出し側 (Authenticator) で匿名扱いに畳まれるので、ここに来るのはそれ以外の経路
            ResolveError::NotFound => AppError::external_service(
                "oauth service: access token not found",
                StatusCode::NOT_FOUND,
            ),
        }
    }
}
