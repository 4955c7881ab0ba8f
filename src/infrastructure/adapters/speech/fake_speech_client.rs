//! Fake Speech Client - 用于测试的合成客户端
//!
//! 始终返回固定的音频字节，不实际调用合成服务

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{
    SpeechEngineError, SpeechEnginePort, SpeechRequest, SpeechResponse,
};

/// Fake Speech Client
pub struct FakeSpeechClient {
    /// 模拟的合成延迟
    delay: Duration,
}

impl FakeSpeechClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FakeSpeechClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl SpeechEnginePort for FakeSpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechEngineError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice.voice_id,
            "FakeSpeechClient: returning fixed audio"
        );

        tokio::time::sleep(self.delay).await;

        // 最小合法 MP3 帧头 + 占位数据
        Ok(SpeechResponse {
            audio_data: vec![0xFF, 0xFB, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00],
            duration_ms: Some(1_000),
        })
    }
}
