//! Book Context - Errors

use thiserror::Error;

use super::BookId;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("图书不存在: {0}")]
    NotFound(BookId),

    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("不支持的文件格式: {0}")]
    UnsupportedFormat(String),

    #[error("提取的文本为空")]
    EmptyText,

    #[error("文件读取错误: {0}")]
    FileReadError(String),
}
