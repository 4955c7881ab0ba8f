//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 摄取失败（文件不可读/格式不支持）
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// 分析失败（提取后的文本为空/不可读）
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// 生成失败 - 作用域是单个工件或 Job，绝不全局
    #[error("Generation failure: {0}")]
    Generation(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 问答缺少已加载的图书
    #[error("No book loaded")]
    NoContext,

    /// 外部服务超出时限
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    Validation(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    Repository(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalService(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建摄取错误
    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion(message.into())
    }

    /// 创建分析错误
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<crate::application::ports::RepositoryError> for ApplicationError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        match err {
            crate::application::ports::RepositoryError::NotFound(msg) => Self::NotFound {
                resource_type: "Book",
                id: msg,
            },
            other => Self::Repository(other.to_string()),
        }
    }
}

impl From<crate::application::ports::AssetError> for ApplicationError {
    fn from(err: crate::application::ports::AssetError) -> Self {
        match err {
            crate::application::ports::AssetError::NotFound(msg) => Self::NotFound {
                resource_type: "Asset",
                id: msg,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<crate::application::ports::ExtractorError> for ApplicationError {
    fn from(err: crate::application::ports::ExtractorError) -> Self {
        match err {
            crate::application::ports::ExtractorError::Timeout => {
                Self::Timeout("text extraction".to_string())
            }
            other => Self::Ingestion(other.to_string()),
        }
    }
}

impl From<crate::application::ports::AnalysisProviderError> for ApplicationError {
    fn from(err: crate::application::ports::AnalysisProviderError) -> Self {
        match err {
            crate::application::ports::AnalysisProviderError::Timeout => {
                Self::Timeout("analysis provider".to_string())
            }
            other => Self::ExternalService(other.to_string()),
        }
    }
}

impl From<crate::application::ports::JobError> for ApplicationError {
    fn from(err: crate::application::ports::JobError) -> Self {
        match err {
            crate::application::ports::JobError::NotFound(id) => Self::NotFound {
                resource_type: "Job",
                id: id.to_string(),
            },
            other => Self::Generation(other.to_string()),
        }
    }
}

impl From<crate::application::ports::PortraitCacheError> for ApplicationError {
    fn from(err: crate::application::ports::PortraitCacheError) -> Self {
        Self::Storage(err.to_string())
    }
}
