//! Book Context - 图书限界上下文
//!
//! 职责:
//! - 图书聚合管理（元数据 + 原文路径）
//! - 语义分析结果（摘要、角色、场景）
//! - 角色与章节实体

mod aggregate;
mod analysis;
mod errors;
mod value_objects;

pub use aggregate::Book;
pub use analysis::{Analysis, Chapter, Entity, DEFAULT_ENTITY_ROLE};
pub use errors::BookError;
pub use value_objects::{BookFormat, BookId, Title};
