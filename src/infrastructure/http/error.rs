//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const BAD_GATEWAY: i32 = 502;
    pub const GATEWAY_TIMEOUT: i32 = 504;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    UpstreamFailure(String),
    Timeout(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match &self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno = errno::NOT_FOUND, error = %msg, "Resource not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(errno::NOT_FOUND, msg.clone()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = errno::BAD_REQUEST, error = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(errno::BAD_REQUEST, msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = errno::INTERNAL_ERROR, error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(errno::INTERNAL_ERROR, msg.clone()),
                )
            }
            ApiError::UpstreamFailure(msg) => {
                tracing::error!(errno = errno::BAD_GATEWAY, error = %msg, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::new(errno::BAD_GATEWAY, msg.clone()),
                )
            }
            ApiError::Timeout(msg) => {
                tracing::warn!(errno = errno::GATEWAY_TIMEOUT, error = %msg, "Upstream timeout");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorResponse::new(errno::GATEWAY_TIMEOUT, msg.clone()),
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::NoContext => ApiError::BadRequest("No book uploaded".to_string()),
            ApplicationError::Ingestion(msg) | ApplicationError::Analysis(msg) => {
                ApiError::BadRequest(msg)
            }
            ApplicationError::Validation(msg) => ApiError::BadRequest(msg),
            ApplicationError::Timeout(msg) => ApiError::Timeout(msg),
            ApplicationError::Generation(msg) | ApplicationError::ExternalService(msg) => {
                ApiError::UpstreamFailure(msg)
            }
            ApplicationError::Repository(msg)
            | ApplicationError::Storage(msg)
            | ApplicationError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}
