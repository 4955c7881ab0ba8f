//! Analysis Provider Port - 语义分析协作方
//!
//! 摘要/角色/场景提取、问答、问题建议、播客脚本均由外部 LLM 服务
//! 完成；此端口刻意保持窄接口，调用方自行做上下文截断。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 分析服务错误
#[derive(Debug, Error)]
pub enum AnalysisProviderError {
    #[error("Analysis service error: {0}")]
    ServiceError(String),

    #[error("Analysis request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// 服务返回的角色条目（摄取时立即解析为领域 Entity）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntity {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub appearance: String,
}

/// 服务返回的原始分析
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAnalysis {
    pub summary: String,
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default)]
    pub scenes: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// 播客脚本行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub speaker: String,
    pub text: String,
}

/// Analysis Provider Port
#[async_trait]
pub trait AnalysisProviderPort: Send + Sync {
    /// 语义分析：摘要 + 角色 + 场景 + 主题
    async fn analyze(&self, text: &str) -> Result<RawAnalysis, AnalysisProviderError>;

    /// 基于限定上下文回答问题
    async fn answer(&self, context: &str, question: &str)
        -> Result<String, AnalysisProviderError>;

    /// 为当前图书生成建议问题
    async fn suggest_questions(&self, context: &str)
        -> Result<Vec<String>, AnalysisProviderError>;

    /// 生成双主持人播客脚本（按播放顺序）
    async fn podcast_script(&self, context: &str)
        -> Result<Vec<ScriptLine>, AnalysisProviderError>;
}
