//! Speech Engine Port - 语音合成协作方

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::generation::VoiceSettings;

/// 语音合成错误
#[derive(Debug, Error)]
pub enum SpeechEngineError {
    #[error("Speech service error: {0}")]
    ServiceError(String),

    #[error("Speech request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// 合成请求
///
/// text 由调用方截断到成本上界后传入，端口不再二次截断。
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: VoiceSettings,
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    pub audio_data: Vec<u8>,
    /// 播放时长（服务商可能不提供）
    pub duration_ms: Option<u64>,
}

/// Speech Engine Port
#[async_trait]
pub trait SpeechEnginePort: Send + Sync {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechEngineError>;
}
