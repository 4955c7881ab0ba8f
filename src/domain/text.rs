//! 文本工具
//!
//! 上下文截取、角色名规范化、章节边界启发式

use crate::domain::book::Chapter;

/// 截取前 max_chars 个字符（UTF-8 安全）
///
/// 全文送入外部服务前的成本上界；超出部分直接丢弃。
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// 规范化角色名，用于去重与缓存 key
///
/// 规则: 去首尾空白、折叠连续空白、casefold
pub fn normalize_entity_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 章节边界启发式分割
///
/// 识别两类标题行:
/// 1. 以 "chapter" 开头（不区分大小写）
/// 2. 全大写且短于 50 字符的独立行
pub fn segment_chapters(text: &str) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut offset = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        let is_chapter_line = trimmed.to_lowercase().starts_with("chapter");
        let is_upper_heading = !trimmed.is_empty()
            && trimmed.len() < 50
            && trimmed.chars().any(|c| c.is_alphabetic())
            && trimmed
                .chars()
                .filter(|c| c.is_alphabetic())
                .all(|c| c.is_uppercase());

        if is_chapter_line || is_upper_heading {
            chapters.push(Chapter {
                title: trimmed.to_string(),
                offset,
            });
        }

        // +1 补回 lines() 吃掉的换行
        offset += line.chars().count() + 1;
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_text_unchanged() {
        assert_eq!(excerpt("hello", 10), "hello");
    }

    #[test]
    fn test_excerpt_truncates_by_chars() {
        assert_eq!(excerpt("hello world", 5), "hello");
        // 多字节字符不被截断在字节中间
        assert_eq!(excerpt("白鲸记白鲸记", 3), "白鲸记");
    }

    #[test]
    fn test_excerpt_exact_boundary() {
        assert_eq!(excerpt("abc", 3), "abc");
    }

    #[test]
    fn test_normalize_entity_name() {
        assert_eq!(normalize_entity_name("  Captain   Ahab "), "captain ahab");
        assert_eq!(normalize_entity_name("ISHMAEL"), "ishmael");
        assert_eq!(normalize_entity_name("   "), "");
    }

    #[test]
    fn test_segment_chapters() {
        let text = "Chapter 1\nCall me Ishmael.\nSome years ago.\nTHE SERMON\nFather Mapple rose.\n";
        let chapters = segment_chapters(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[0].offset, 0);
        assert_eq!(chapters[1].title, "THE SERMON");
    }

    #[test]
    fn test_segment_chapters_ignores_long_upper_lines() {
        let long_upper = "A".repeat(60);
        let text = format!("{}\nplain text\n", long_upper);
        assert!(segment_chapters(&text).is_empty());
    }
}
