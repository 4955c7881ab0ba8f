//! Text Extractor Port - 文本提取协作方
//!
//! PDF/EPUB/TXT 的正文提取（含扫描件 OCR 兜底）由外部服务完成，
//! 本核心只消费其窄接口。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::book::BookFormat;

/// 提取错误
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unreadable file: {0}")]
    Unreadable(String),

    #[error("Extractor service error: {0}")]
    ServiceError(String),

    #[error("Extractor request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// 提取请求
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub filename: String,
    pub format: BookFormat,
    pub data: Vec<u8>,
}

/// 提取结果
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// 识别出的标题（缺省 "Unknown"）
    pub title: String,
    /// 识别出的作者（可为空串）
    pub author: String,
    /// 连续正文
    pub body: String,
}

/// Text Extractor Port
#[async_trait]
pub trait TextExtractorPort: Send + Sync {
    async fn extract(&self, request: ExtractRequest) -> Result<ExtractedText, ExtractorError>;
}
