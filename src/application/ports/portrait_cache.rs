//! Portrait Cache Port - 角色头像缓存
//!
//! 按 (book, 规范化角色名, 风格) 缓存昂贵的头像生成结果。
//! 头像是书内私有的：跨书同名角色不共享形象。
//! 失败以"缺席"形式缓存，下次请求重新生成，而非永久拒绝。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::book::BookId;
use crate::domain::normalize_entity_name;

/// 缓存错误
#[derive(Debug, Error)]
pub enum PortraitCacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存 key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortraitKey {
    pub book_id: BookId,
    /// 规范化后的角色名
    pub entity_name: String,
    pub style: String,
}

impl PortraitKey {
    pub fn new(book_id: BookId, entity_name: &str, style: impl Into<String>) -> Self {
        Self {
            book_id,
            entity_name: normalize_entity_name(entity_name),
            style: style.into(),
        }
    }
}

/// 缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortraitRecord {
    /// 资产库内相对路径
    pub rel_path: String,
    /// 单调递增版本号，显式重新生成时 +1，用于打穿客户端缓存
    pub version: u64,
    pub created_at: i64,
}

/// 生成缓存 key 字符串
///
/// md5(book_id:规范化名:style)，与存储实现解耦
pub fn portrait_cache_key(key: &PortraitKey) -> String {
    let material = format!("{}:{}:{}", key.book_id, key.entity_name, key.style);
    format!("{:x}", md5::compute(material.as_bytes()))
}

/// Portrait Cache Port
#[async_trait]
pub trait PortraitCachePort: Send + Sync {
    /// 命中返回条目，未命中返回 None（不会触发生成）
    async fn get(&self, key: &PortraitKey) -> Result<Option<PortraitRecord>, PortraitCacheError>;

    /// 写入条目
    ///
    /// key 已存在时版本号 +1（显式重新生成走这条路径打穿客户端缓存），
    /// 否则从 1 起算。生成失败时不调用 put，缺席即缓存的失败形态。
    async fn put(&self, key: &PortraitKey, rel_path: &str)
        -> Result<PortraitRecord, PortraitCacheError>;

    /// 删除某本书的全部头像缓存
    async fn remove_book_scope(&self, book_id: BookId) -> Result<usize, PortraitCacheError>;
}
