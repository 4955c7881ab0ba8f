//! Fake Image Client - 用于测试的图像客户端
//!
//! 返回一字节占位图，不实际调用生成服务

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{ImageEngineError, ImageEnginePort, ImageRequest};

/// Fake Image Client
pub struct FakeImageClient {
    /// 模拟的生成延迟
    delay: Duration,
}

impl FakeImageClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FakeImageClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl ImageEnginePort for FakeImageClient {
    async fn generate(&self, request: ImageRequest) -> Result<Vec<u8>, ImageEngineError> {
        tracing::debug!(
            seed = request.seed,
            prompt_len = request.prompt.len(),
            "FakeImageClient: returning placeholder image"
        );

        tokio::time::sleep(self.delay).await;

        // JPEG SOI 标记 + 占位数据
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
    }
}
