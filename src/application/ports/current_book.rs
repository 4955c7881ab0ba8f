//! Current Book Port - 当前阅读上下文
//!
//! 问答、生成、头像预取共享的"当前图书"槽位。切换必须对读者原子：
//! 并发读要么看到旧书、要么看到新书，绝不出现混合状态。

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::domain::book::{Analysis, Book, BookId};

/// 当前加载的图书上下文（不可变快照，整体替换）
#[derive(Debug)]
pub struct CurrentBook {
    pub book: Book,
    pub analysis: Analysis,
    /// 提取后的全文（加载时读入一次）
    pub full_text: String,
    /// 建议问题 - 每次加载派生一次，会话期内缓存
    pub suggested_questions: OnceCell<Vec<String>>,
}

impl CurrentBook {
    pub fn new(book: Book, analysis: Analysis, full_text: String) -> Self {
        Self {
            book,
            analysis,
            full_text,
            suggested_questions: OnceCell::new(),
        }
    }
}

/// Current Book Port
pub trait CurrentBookPort: Send + Sync {
    /// 原子替换当前上下文
    fn set(&self, book: Arc<CurrentBook>);

    /// 当前上下文快照（Arc 克隆，读不加长锁）
    fn get(&self) -> Option<Arc<CurrentBook>>;

    /// 若当前上下文是指定图书则清空（删除图书时调用）
    fn clear_if(&self, book_id: BookId);
}
