//! Book Commands

use crate::domain::book::{BookFormat, BookId};

/// 摄取图书命令（上传文件 → 提取 → 分析 → 入库 → 设为当前）
#[derive(Debug, Clone)]
pub struct IngestBook {
    pub filename: String,
    pub format: BookFormat,
    pub data: Vec<u8>,
}

/// 加载书架条目为当前图书
#[derive(Debug, Clone)]
pub struct LoadBook {
    pub book_id: BookId,
}

/// 删除图书（级联清理分析、资产与头像缓存）
#[derive(Debug, Clone)]
pub struct DeleteBook {
    pub book_id: BookId,
}
