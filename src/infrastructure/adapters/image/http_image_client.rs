//! HTTP Image Client - 调用外部图像生成服务
//!
//! 实现 ImageEnginePort trait。提示词 + 种子 + 尺寸经 URL 编码后
//! GET，响应即图像字节。429 映射为 RateLimited 交给上层退避调度。
//!
//! 外部图像 API:
//! GET {base}/prompt/{encoded_prompt}?seed={seed}&width={w}&height={h}&nologo=true

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use reqwest::StatusCode;
use std::time::Duration;

use crate::application::ports::{ImageEngineError, ImageEnginePort, ImageRequest};

/// HTTP 图像客户端配置
#[derive(Debug, Clone)]
pub struct HttpImageClientConfig {
    /// 图像服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）- 生成型服务响应慢
    pub timeout_secs: u64,
}

impl Default for HttpImageClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://image.pollinations.ai".to_string(),
            timeout_secs: 90,
        }
    }
}

/// HTTP 图像客户端
pub struct HttpImageClient {
    client: Client,
    config: HttpImageClientConfig,
}

impl HttpImageClient {
    pub fn new(config: HttpImageClientConfig) -> Result<Self, ImageEngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ImageEngineError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn image_url(&self, request: &ImageRequest) -> String {
        let encoded = utf8_percent_encode(&request.prompt, NON_ALPHANUMERIC);
        format!(
            "{}/prompt/{}?seed={}&width={}&height={}&nologo=true",
            self.config.base_url, encoded, request.seed, request.width, request.height
        )
    }
}

#[async_trait]
impl ImageEnginePort for HttpImageClient {
    async fn generate(&self, request: ImageRequest) -> Result<Vec<u8>, ImageEngineError> {
        let url = self.image_url(&request);

        tracing::debug!(
            seed = request.seed,
            width = request.width,
            height = request.height,
            "Sending image request"
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ImageEngineError::Timeout
            } else {
                ImageEngineError::NetworkError(e.to_string())
            }
        })?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ImageEngineError::NetworkError(e.to_string()))?
                    .to_vec();

                tracing::info!(size = bytes.len(), seed = request.seed, "Image generated");
                Ok(bytes)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ImageEngineError::RateLimited),
            status if status.is_server_error() => {
                // 5xx 视为瞬态，交给退避调度
                Err(ImageEngineError::NetworkError(format!("HTTP {}", status)))
            }
            status => {
                // 其余 4xx 是永久错误，重试无意义
                let error_text = response.text().await.unwrap_or_default();
                Err(ImageEngineError::ServiceError(format!(
                    "HTTP {}: {}",
                    status, error_text
                )))
            }
        }
    }
}
