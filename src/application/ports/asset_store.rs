//! Asset Store Port - 生成资产存储
//!
//! 内容按 {book_id}/{workflow}/... 的相对路径落盘；工件 location 在
//! 内容存在之前即对外公布，exists 是轮询协议的真实来源。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::book::BookId;

/// 资产存储错误
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Asset Store Port
#[async_trait]
pub trait AssetStorePort: Send + Sync {
    /// 原子写入（临时文件 + rename），写完成前 exists 为 false
    async fn write(&self, rel_path: &str, data: &[u8]) -> Result<(), AssetError>;

    /// 工件内容是否已存在
    async fn exists(&self, rel_path: &str) -> bool;

    /// 读取资产字节；不存在时返回 NotFound
    async fn read(&self, rel_path: &str) -> Result<Vec<u8>, AssetError>;

    /// 删除某本书的全部资产目录
    async fn remove_book_scope(&self, book_id: BookId) -> Result<(), AssetError>;

    /// 对外公布的 URL（相对服务前缀）
    fn public_url(&self, rel_path: &str) -> String;
}
