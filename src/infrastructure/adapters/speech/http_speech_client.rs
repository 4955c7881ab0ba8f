//! HTTP Speech Client - 调用外部语音合成服务
//!
//! 实现 SpeechEnginePort trait。服务商路由（Deepgram / ElevenLabs /
//! 内置兜底）在服务侧完成，本客户端只携带参数。
//!
//! 外部合成 API:
//! POST {base}/api/speak
//! Request: {"text": "...", "voice_id": "...", "stability": 0.5, ...}  (JSON)
//! Response: audio binary, metadata in headers

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{
    SpeechEngineError, SpeechEnginePort, SpeechRequest, SpeechResponse,
};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SpeakHttpRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    stability: f32,
    similarity_boost: f32,
    style: f32,
    provider: &'a str,
}

/// HTTP 合成客户端配置
#[derive(Debug, Clone)]
pub struct HttpSpeechClientConfig {
    /// 合成服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8300".to_string(),
            timeout_secs: 120,
        }
    }
}

/// HTTP 合成客户端
pub struct HttpSpeechClient {
    client: Client,
    config: HttpSpeechClientConfig,
}

impl HttpSpeechClient {
    pub fn new(config: HttpSpeechClientConfig) -> Result<Self, SpeechEngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechEngineError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn speak_url(&self) -> String {
        format!("{}/api/speak", self.config.base_url)
    }
}

#[async_trait]
impl SpeechEnginePort for HttpSpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechEngineError> {
        let body = SpeakHttpRequest {
            text: &request.text,
            voice_id: &request.voice.voice_id,
            stability: request.voice.stability,
            similarity_boost: request.voice.similarity_boost,
            style: request.voice.style,
            provider: request.voice.provider.as_str(),
        };

        tracing::debug!(
            url = %self.speak_url(),
            text_len = request.text.len(),
            voice_id = %request.voice.voice_id,
            provider = request.voice.provider.as_str(),
            "Sending speech request"
        );

        let response = self
            .client
            .post(&self.speak_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechEngineError::Timeout
                } else if e.is_connect() {
                    SpeechEngineError::NetworkError(format!(
                        "Cannot connect to speech service: {}",
                        e
                    ))
                } else {
                    SpeechEngineError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechEngineError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let duration_ms = response
            .headers()
            .get("X-Audio-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| SpeechEngineError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(SpeechEngineError::InvalidResponse(
                "empty audio payload".to_string(),
            ));
        }

        tracing::info!(
            duration_ms = ?duration_ms,
            audio_size = audio_data.len(),
            "Speech synthesis completed"
        );

        Ok(SpeechResponse {
            audio_data,
            duration_ms,
        })
    }
}
