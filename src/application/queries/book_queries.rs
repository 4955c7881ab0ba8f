//! Book Queries

use uuid::Uuid;

use crate::application::ports::LibraryOrder;

/// 获取当前图书正文
#[derive(Debug, Clone)]
pub struct GetStory;

/// 列出书架（顺序由调用方指定）
#[derive(Debug, Clone, Default)]
pub struct ListLibrary {
    pub order: LibraryOrder,
}

/// 按 id 查询生成任务状态
#[derive(Debug, Clone)]
pub struct GetJobStatus {
    pub job_id: Uuid,
}

/// 获取（或惰性生成）角色头像
#[derive(Debug, Clone)]
pub struct GetEntityPortrait {
    pub entity_name: String,
    pub role: String,
    pub style: String,
}
