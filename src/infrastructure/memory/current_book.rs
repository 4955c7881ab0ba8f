//! In-Memory Current Book Slot
//!
//! 单一可变槽位，被问答、生成、头像预取并发读取。写入是整体 Arc
//! 替换：读者要么拿到旧快照、要么拿到新快照，不存在混合状态。

use std::sync::{Arc, RwLock};

use crate::application::ports::{CurrentBook, CurrentBookPort};
use crate::domain::book::BookId;

/// 当前图书槽位
pub struct InMemoryCurrentBook {
    slot: RwLock<Option<Arc<CurrentBook>>>,
}

impl InMemoryCurrentBook {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryCurrentBook {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentBookPort for InMemoryCurrentBook {
    fn set(&self, book: Arc<CurrentBook>) {
        let book_id = book.book.id();
        *self.slot.write().expect("current book lock poisoned") = Some(book);
        tracing::info!(book_id = %book_id, "Current book switched");
    }

    fn get(&self) -> Option<Arc<CurrentBook>> {
        self.slot
            .read()
            .expect("current book lock poisoned")
            .clone()
    }

    fn clear_if(&self, book_id: BookId) {
        let mut slot = self.slot.write().expect("current book lock poisoned");
        if slot.as_ref().map(|c| c.book.id()) == Some(book_id) {
            *slot = None;
            tracing::info!(book_id = %book_id, "Current book cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::{Analysis, Book, BookFormat, Title};
    use std::path::PathBuf;

    fn snapshot(title: &str) -> Arc<CurrentBook> {
        let book = Book::new(
            Title::new(title).unwrap(),
            "Author",
            "f.txt",
            BookFormat::Txt,
            PathBuf::from("x/book.txt"),
            1,
        );
        Arc::new(CurrentBook::new(
            book,
            Analysis::default(),
            "text".to_string(),
        ))
    }

    #[test]
    fn test_switch_replaces_whole_snapshot() {
        let slot = InMemoryCurrentBook::new();
        assert!(slot.get().is_none());

        let first = snapshot("First");
        slot.set(first.clone());
        assert_eq!(slot.get().unwrap().book.title().as_str(), "First");

        // 旧快照在读者手里保持完整
        let held = slot.get().unwrap();
        slot.set(snapshot("Second"));
        assert_eq!(held.book.title().as_str(), "First");
        assert_eq!(slot.get().unwrap().book.title().as_str(), "Second");
    }

    #[test]
    fn test_clear_if_only_matching_book() {
        let slot = InMemoryCurrentBook::new();
        let current = snapshot("Current");
        let current_id = current.book.id();
        slot.set(current);

        // 其他书的删除不影响当前槽位
        slot.clear_if(crate::domain::book::BookId::new());
        assert!(slot.get().is_some());

        slot.clear_if(current_id);
        assert!(slot.get().is_none());
    }
}
