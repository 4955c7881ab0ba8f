//! HTTP Analysis Client - 调用外部语义分析服务
//!
//! 实现 AnalysisProviderPort trait。LLM 编排（模型选择、提示词、
//! 重试内细节）在服务侧，本客户端只传上下文、收结构化结果。
//!
//! 外部分析 API:
//! POST {base}/api/analyze          {"text": "..."}
//! POST {base}/api/answer           {"context": "...", "question": "..."}
//! POST {base}/api/suggest          {"context": "..."}
//! POST {base}/api/podcast_script   {"text": "..."}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::application::ports::{
    AnalysisProviderError, AnalysisProviderPort, RawAnalysis, ScriptLine,
};

/// HTTP 分析客户端配置
#[derive(Debug, Clone)]
pub struct HttpAnalysisClientConfig {
    /// 分析服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 最大重试次数（指数退避）
    pub max_retries: u32,
}

impl Default for HttpAnalysisClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8200".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// HTTP 分析客户端
pub struct HttpAnalysisClient {
    client: Client,
    config: HttpAnalysisClientConfig,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    questions: Vec<String>,
}

impl HttpAnalysisClient {
    pub fn new(config: HttpAnalysisClientConfig) -> Result<Self, AnalysisProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisProviderError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.config.base_url, endpoint)
    }

    /// 带重试的 POST-JSON 调用
    ///
    /// 仅对超时/网络错误重试，服务端 4xx/5xx 原样上报
    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T, AnalysisProviderError> {
        let mut last_error = AnalysisProviderError::ServiceError("no attempt made".to_string());

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    endpoint = endpoint,
                    attempt = attempt,
                    backoff_secs = backoff.as_secs(),
                    "Retrying analysis request"
                );
                tokio::time::sleep(backoff).await;
            }

            let result = self.client.post(self.url(endpoint)).json(body).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let error_text = response.text().await.unwrap_or_default();
                        return Err(AnalysisProviderError::ServiceError(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                    return response.json::<T>().await.map_err(|e| {
                        AnalysisProviderError::InvalidResponse(e.to_string())
                    });
                }
                Err(e) if e.is_timeout() => {
                    last_error = AnalysisProviderError::Timeout;
                }
                Err(e) => {
                    last_error = AnalysisProviderError::NetworkError(e.to_string());
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl AnalysisProviderPort for HttpAnalysisClient {
    async fn analyze(&self, text: &str) -> Result<RawAnalysis, AnalysisProviderError> {
        tracing::debug!(chars = text.chars().count(), "Sending analyze request");
        self.post_json("analyze", &json!({ "text": text })).await
    }

    async fn answer(
        &self,
        context: &str,
        question: &str,
    ) -> Result<String, AnalysisProviderError> {
        let response: AnswerResponse = self
            .post_json(
                "answer",
                &json!({ "context": context, "question": question }),
            )
            .await?;
        Ok(response.answer)
    }

    async fn suggest_questions(
        &self,
        context: &str,
    ) -> Result<Vec<String>, AnalysisProviderError> {
        let response: SuggestResponse = self
            .post_json("suggest", &json!({ "context": context }))
            .await?;
        Ok(response.questions)
    }

    async fn podcast_script(
        &self,
        context: &str,
    ) -> Result<Vec<ScriptLine>, AnalysisProviderError> {
        self.post_json("podcast_script", &json!({ "text": context }))
            .await
    }
}
