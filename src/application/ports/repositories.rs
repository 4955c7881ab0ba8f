//! Repository Ports - 出站端口
//!
//! 定义图书目录持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::book::{Analysis, Book, BookId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 图书记录（元数据，不含全文）
pub type BookRecord = Book;

/// 列表排序方式 - 由调用方在读取时指定，仓储不固化顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryOrder {
    /// 上传时间降序（最新在前）
    #[default]
    DateDesc,
    /// 上传时间升序
    DateAsc,
    /// 标题字典序
    Title,
}

impl LibraryOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "date_desc" => Some(LibraryOrder::DateDesc),
            "date_asc" => Some(LibraryOrder::DateAsc),
            "title" => Some(LibraryOrder::Title),
            _ => None,
        }
    }
}

/// Book Repository Port
///
/// 图书目录与分析结果的持久化。重启后必须能够重建书架列表并
/// 重新加载任何图书的分析，而无需再次调用外部服务。
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存图书记录（仅摄取时调用）
    async fn save(&self, book: &BookRecord) -> Result<(), RepositoryError>;

    /// 按 id 查找
    async fn find_by_id(&self, id: BookId) -> Result<Option<BookRecord>, RepositoryError>;

    /// 按调用方指定的顺序列出全部图书
    async fn find_all(&self, order: LibraryOrder) -> Result<Vec<BookRecord>, RepositoryError>;

    /// 删除图书及其分析（单事务，不留半删状态）
    ///
    /// id 不存在时返回 NotFound
    async fn delete(&self, id: BookId) -> Result<(), RepositoryError>;

    /// 保存分析结果（替换旧值）
    async fn save_analysis(&self, book_id: BookId, analysis: &Analysis)
        -> Result<(), RepositoryError>;

    /// 读取分析结果
    async fn find_analysis(&self, book_id: BookId) -> Result<Option<Analysis>, RepositoryError>;
}
