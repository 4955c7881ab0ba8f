//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{BookFormat, BookId, Title};

/// Book 聚合根
///
/// 不变量:
/// - 创建后元数据不可变（仅派生资产可追加）
/// - 提取后的全文落盘一次，路径固定
/// - 删除必须级联清理 Analysis 与全部派生资产
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: Title,
    author: String,
    filename: String,
    format: BookFormat,
    /// 提取后的全文文件路径（惰性读取，不随记录加载）
    text_path: PathBuf,
    file_size: u64,
    thumbnail: Option<String>,
    upload_date: DateTime<Utc>,
}

impl Book {
    /// 创建新图书（摄取时调用一次）
    pub fn new(
        title: Title,
        author: impl Into<String>,
        filename: impl Into<String>,
        format: BookFormat,
        text_path: PathBuf,
        file_size: u64,
    ) -> Self {
        Self {
            id: BookId::new(),
            title,
            author: author.into(),
            filename: filename.into(),
            format,
            text_path,
            file_size,
            thumbnail: None,
            upload_date: Utc::now(),
        }
    }

    /// 从持久化字段重建（仓储层使用）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: BookId,
        title: Title,
        author: String,
        filename: String,
        format: BookFormat,
        text_path: PathBuf,
        file_size: u64,
        thumbnail: Option<String>,
        upload_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            filename,
            format,
            text_path,
            file_size,
            thumbnail,
            upload_date,
        }
    }

    pub fn set_thumbnail(&mut self, thumbnail: impl Into<String>) {
        self.thumbnail = Some(thumbnail.into());
    }

    // Getters
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format(&self) -> BookFormat {
        self.format
    }

    pub fn text_path(&self) -> &PathBuf {
        &self.text_path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn upload_date(&self) -> DateTime<Utc> {
        self.upload_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_creation() {
        let book = Book::new(
            Title::new("Moby Dick").unwrap(),
            "Herman Melville",
            "moby.txt",
            BookFormat::Txt,
            PathBuf::from("data/books/x.txt"),
            1024,
        );

        assert_eq!(book.title().as_str(), "Moby Dick");
        assert_eq!(book.author(), "Herman Melville");
        assert_eq!(book.format(), BookFormat::Txt);
        assert!(book.thumbnail().is_none());
    }
}
