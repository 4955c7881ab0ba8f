//! HTTP Extractor Client - 调用外部文本提取服务
//!
//! 实现 TextExtractorPort trait，通过 HTTP 调用外部提取服务
//! （PDF 布局分析与扫描件 OCR 均在服务内部完成）
//!
//! 外部提取 API:
//! POST {base}/api/extract  (multipart: file + format)
//! Response: {"title": "...", "author": "...", "body": "..."}  (JSON)

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{
    ExtractedText, ExtractorError, ExtractRequest, TextExtractorPort,
};

/// HTTP 提取客户端配置
#[derive(Debug, Clone)]
pub struct HttpExtractorClientConfig {
    /// 提取服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）- 扫描件 OCR 很慢，上限要宽
    pub timeout_secs: u64,
}

impl Default for HttpExtractorClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            timeout_secs: 300,
        }
    }
}

/// 提取服务响应体
#[derive(Debug, Deserialize)]
struct ExtractHttpResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    body: String,
}

/// HTTP 提取客户端
pub struct HttpExtractorClient {
    client: Client,
    config: HttpExtractorClientConfig,
}

impl HttpExtractorClient {
    pub fn new(config: HttpExtractorClientConfig) -> Result<Self, ExtractorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractorError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn extract_url(&self) -> String {
        format!("{}/api/extract", self.config.base_url)
    }
}

#[async_trait]
impl TextExtractorPort for HttpExtractorClient {
    async fn extract(&self, request: ExtractRequest) -> Result<ExtractedText, ExtractorError> {
        tracing::debug!(
            url = %self.extract_url(),
            filename = %request.filename,
            format = %request.format,
            size = request.data.len(),
            "Sending extract request"
        );

        let form = multipart::Form::new()
            .text("format", request.format.as_str())
            .part(
                "file",
                multipart::Part::bytes(request.data).file_name(request.filename.clone()),
            );

        let response = self
            .client
            .post(&self.extract_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractorError::Timeout
                } else if e.is_connect() {
                    ExtractorError::NetworkError(format!(
                        "Cannot connect to extractor service: {}",
                        e
                    ))
                } else {
                    ExtractorError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractorError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ExtractHttpResponse = response
            .json()
            .await
            .map_err(|e| ExtractorError::ServiceError(format!("Invalid response: {}", e)))?;

        tracing::info!(
            filename = %request.filename,
            title = %body.title,
            chars = body.body.chars().count(),
            "Text extraction completed"
        );

        Ok(ExtractedText {
            title: body.title,
            author: body.author,
            body: body.body,
        })
    }
}
