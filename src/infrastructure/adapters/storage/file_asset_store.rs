//! File Asset Store - 文件系统资产库实现
//!
//! 生成资产按 {book_id}/{workflow}/... 布局落盘。写入走临时文件 +
//! rename：location 对外公布在前、内容出现在后，轮询方绝不会读到
//! 半写状态。

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AssetError, AssetStorePort};
use crate::domain::book::BookId;

/// 文件系统资产库
pub struct FileAssetStore {
    /// 存储根目录
    base_dir: PathBuf,
    /// 对外 URL 前缀（如 /api/assets）
    url_prefix: String,
}

impl FileAssetStore {
    pub async fn new(
        base_dir: impl AsRef<Path>,
        url_prefix: impl Into<String>,
    ) -> Result<Self, AssetError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| AssetError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            url_prefix: url_prefix.into(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 校验相对路径并拼出绝对路径（拒绝逃出根目录的路径）
    fn resolve(&self, rel_path: &str) -> Result<PathBuf, AssetError> {
        let rel = Path::new(rel_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(AssetError::InvalidPath(rel_path.to_string()));
        }
        Ok(self.base_dir.join(rel))
    }
}

#[async_trait]
impl AssetStorePort for FileAssetStore {
    async fn write(&self, rel_path: &str, data: &[u8]) -> Result<(), AssetError> {
        let path = self.resolve(rel_path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AssetError::IoError(e.to_string()))?;
        }

        // 临时文件 + rename，exists 翻转即内容完整
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)
            .await
            .map_err(|e| AssetError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| AssetError::IoError(e.to_string()))?;

        Ok(())
    }

    async fn exists(&self, rel_path: &str) -> bool {
        match self.resolve(rel_path) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn read(&self, rel_path: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.resolve(rel_path)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(rel_path.to_string()))
            }
            Err(e) => Err(AssetError::IoError(e.to_string())),
        }
    }

    async fn remove_book_scope(&self, book_id: BookId) -> Result<(), AssetError> {
        let dir = self.base_dir.join(book_id.to_string());
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(book_id = %book_id, "Asset directory removed");
                Ok(())
            }
            // 没生成过任何资产的书目录不存在，视为已删除
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AssetError::IoError(e.to_string())),
        }
    }

    fn public_url(&self, rel_path: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), rel_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_exists_then_read() {
        let dir = tempdir().unwrap();
        let store = FileAssetStore::new(dir.path(), "/api/assets").await.unwrap();

        let rel = "book-1/visuals/x/image_00_cover.jpg";
        assert!(!store.exists(rel).await);

        store.write(rel, b"jpeg-bytes").await.unwrap();
        assert!(store.exists(rel).await);
        assert_eq!(store.read(rel).await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FileAssetStore::new(dir.path(), "/api/assets").await.unwrap();

        assert!(matches!(
            store.read("nope/missing.jpg").await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = FileAssetStore::new(dir.path(), "/api/assets").await.unwrap();

        assert!(matches!(
            store.write("../escape.txt", b"x").await,
            Err(AssetError::InvalidPath(_))
        ));
        assert!(matches!(
            store.read("a/../../etc/passwd").await,
            Err(AssetError::InvalidPath(_))
        ));
        assert!(!store.exists("../escape.txt").await);
    }

    #[tokio::test]
    async fn test_remove_book_scope() {
        let dir = tempdir().unwrap();
        let store = FileAssetStore::new(dir.path(), "/api/assets").await.unwrap();
        let book_id = BookId::new();

        let rel = format!("{}/entities/entity_ahab.jpg", book_id);
        store.write(&rel, b"img").await.unwrap();
        assert!(store.exists(&rel).await);

        store.remove_book_scope(book_id).await.unwrap();
        assert!(!store.exists(&rel).await);

        // 不存在的作用域删除是幂等的
        store.remove_book_scope(BookId::new()).await.unwrap();
    }

    #[test]
    fn test_public_url() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempdir().unwrap();
        let store = rt
            .block_on(FileAssetStore::new(dir.path(), "/api/assets/"))
            .unwrap();
        assert_eq!(
            store.public_url("b/visuals/x.jpg"),
            "/api/assets/b/visuals/x.jpg"
        );
    }
}
