//! Sled-based Portrait Cache Implementation
//!
//! 条目 key 带 book 前缀，按书整片清理；值为 bincode 序列化的
//! PortraitRecord。版本号在覆盖写入时递增，重启后延续。

use async_trait::async_trait;
use chrono::Utc;
use sled::Db;
use std::sync::Arc;

use crate::application::ports::{
    portrait_cache_key, PortraitCacheError, PortraitCachePort, PortraitKey, PortraitRecord,
};
use crate::domain::book::BookId;

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledPortraitCacheConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledPortraitCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/assets/portraits.sled".to_string(),
        }
    }
}

/// Sled 头像缓存
pub struct SledPortraitCache {
    db: Db,
}

impl SledPortraitCache {
    pub fn new(config: &SledPortraitCacheConfig) -> Result<Self, PortraitCacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| PortraitCacheError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            entries = db.len(),
            "SledPortraitCache initialized"
        );

        Ok(Self { db })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 存储 key: portrait:{book_id}:{md5(key)}
    ///
    /// book 前缀使按书清理成为一次前缀扫描
    fn storage_key(key: &PortraitKey) -> String {
        format!("portrait:{}:{}", key.book_id, portrait_cache_key(key))
    }

    fn book_prefix(book_id: BookId) -> String {
        format!("portrait:{}:", book_id)
    }
}

#[async_trait]
impl PortraitCachePort for SledPortraitCache {
    async fn get(&self, key: &PortraitKey) -> Result<Option<PortraitRecord>, PortraitCacheError> {
        match self.db.get(Self::storage_key(key)) {
            Ok(Some(data)) => {
                let record: PortraitRecord = bincode::deserialize(&data)
                    .map_err(|e| PortraitCacheError::SerializationError(e.to_string()))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(PortraitCacheError::DatabaseError(e.to_string())),
        }
    }

    async fn put(
        &self,
        key: &PortraitKey,
        rel_path: &str,
    ) -> Result<PortraitRecord, PortraitCacheError> {
        let storage_key = Self::storage_key(key);

        // 覆盖写入递增版本号，客户端缓存据此判旧
        let version = match self.db.get(&storage_key) {
            Ok(Some(data)) => bincode::deserialize::<PortraitRecord>(&data)
                .map(|r| r.version + 1)
                .unwrap_or(1),
            _ => 1,
        };

        let record = PortraitRecord {
            rel_path: rel_path.to_string(),
            version,
            created_at: Utc::now().timestamp(),
        };

        let bytes = bincode::serialize(&record)
            .map_err(|e| PortraitCacheError::SerializationError(e.to_string()))?;
        self.db
            .insert(storage_key, bytes)
            .map_err(|e| PortraitCacheError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            entity = %key.entity_name,
            version = version,
            "Portrait cached"
        );

        Ok(record)
    }

    async fn remove_book_scope(&self, book_id: BookId) -> Result<usize, PortraitCacheError> {
        let keys: Vec<_> = self
            .db
            .scan_prefix(Self::book_prefix(book_id))
            .filter_map(|item| item.ok().map(|(k, _)| k))
            .collect();

        let count = keys.len();
        for key in keys {
            self.db
                .remove(key)
                .map_err(|e| PortraitCacheError::DatabaseError(e.to_string()))?;
        }

        if count > 0 {
            tracing::debug!(book_id = %book_id, count = count, "Portrait cache purged");
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cache(dir: &tempfile::TempDir) -> SledPortraitCache {
        SledPortraitCache::new(&SledPortraitCacheConfig {
            db_path: dir.path().join("test.sled").to_string_lossy().to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = cache(&dir);
        let key = PortraitKey::new(BookId::new(), "Ahab", "storybook");

        assert!(cache.get(&key).await.unwrap().is_none());

        let record = cache.put(&key, "book/entities/entity_ahab.jpg").await.unwrap();
        assert_eq!(record.version, 1);

        let loaded = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(loaded.rel_path, "book/entities/entity_ahab.jpg");
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_overwrite_bumps_version() {
        let dir = tempdir().unwrap();
        let cache = cache(&dir);
        let key = PortraitKey::new(BookId::new(), "Ahab", "storybook");

        cache.put(&key, "a.jpg").await.unwrap();
        let second = cache.put(&key, "b.jpg").await.unwrap();

        assert_eq!(second.version, 2);
        assert_eq!(cache.get(&key).await.unwrap().unwrap().rel_path, "b.jpg");
    }

    #[tokio::test]
    async fn test_styles_are_distinct_keys() {
        let dir = tempdir().unwrap();
        let cache = cache(&dir);
        let book_id = BookId::new();

        cache
            .put(&PortraitKey::new(book_id, "Ahab", "storybook"), "sb.jpg")
            .await
            .unwrap();

        let manga = PortraitKey::new(book_id, "Ahab", "manga");
        assert!(cache.get(&manga).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_book_scope_is_isolated() {
        let dir = tempdir().unwrap();
        let cache = cache(&dir);
        let doomed = BookId::new();
        let kept = BookId::new();

        cache
            .put(&PortraitKey::new(doomed, "Ahab", "storybook"), "a.jpg")
            .await
            .unwrap();
        cache
            .put(&PortraitKey::new(doomed, "Ishmael", "storybook"), "b.jpg")
            .await
            .unwrap();
        cache
            .put(&PortraitKey::new(kept, "Ahab", "storybook"), "c.jpg")
            .await
            .unwrap();

        let removed = cache.remove_book_scope(doomed).await.unwrap();
        assert_eq!(removed, 2);

        assert!(cache
            .get(&PortraitKey::new(doomed, "Ahab", "storybook"))
            .await
            .unwrap()
            .is_none());
        // 同名角色在别的书里不受影响
        assert!(cache
            .get(&PortraitKey::new(kept, "Ahab", "storybook"))
            .await
            .unwrap()
            .is_some());
    }
}
