//! Image Engine Port - 图像生成协作方

use async_trait::async_trait;
use thiserror::Error;

/// 图像生成错误
#[derive(Debug, Error)]
pub enum ImageEngineError {
    #[error("Image service error: {0}")]
    ServiceError(String),

    /// 服务商限流，调用方按退避调度重试
    #[error("Image service rate limited")]
    RateLimited,

    #[error("Image request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ImageEngineError {
    /// 是否值得按调度重试（4xx 类永久错误不重试）
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ImageEngineError::ServiceError(_))
    }
}

/// 图像生成请求
///
/// seed 固定时同一请求可复现（取决于服务商支持）。
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
}

/// Image Engine Port
#[async_trait]
pub trait ImageEnginePort: Send + Sync {
    async fn generate(&self, request: ImageRequest) -> Result<Vec<u8>, ImageEngineError>;
}
