//! Job Tracker Port - 生成任务管理
//!
//! 定义任务跟踪的抽象接口，具体实现在 infrastructure/memory 层。
//! 每个 (book, kind) 同时最多一个非终态 Job；同类新请求超越旧 Job，
//! 旧 Job 的迟到结果按代号判废、不会写入新 Job 的状态。

use thiserror::Error;
use uuid::Uuid;

use crate::domain::book::BookId;
use crate::domain::generation::{ArtifactSpec, GenerationJob, JobKind};

/// Job Tracker 错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Artifact index out of range: {0}")]
    ArtifactOutOfRange(usize),

    #[error("Queue full, try again later")]
    QueueFull,
}

/// 单个工件的工作单 - worker 消费的最小单位
#[derive(Debug, Clone)]
pub struct ArtifactOrder {
    pub job_id: Uuid,
    pub book_id: BookId,
    pub kind: JobKind,
    /// 发出工作单时的 Job 代号，写回前校验
    pub generation: u64,
    pub index: usize,
    pub rel_path: String,
    pub spec: ArtifactSpec,
}

/// Job Tracker Port
///
/// 管理生成任务的生命周期，所有状态存储在内存中
pub trait JobTrackerPort: Send + Sync {
    /// 注册 Job 并将其全部工件入队
    ///
    /// 同 (book, kind) 的活动 Job 被超越；返回入队后的 Job 快照
    fn submit(&self, job: GenerationJob) -> Result<GenerationJob, JobError>;

    /// Job 是否已被同类新请求超越（worker 在调用服务商前/写盘前检查）
    fn is_superseded(&self, job_id: Uuid) -> bool;

    /// 获取 Job 快照
    fn get(&self, job_id: Uuid) -> Option<GenerationJob>;

    /// 当前 (book, kind) 的活动 Job
    fn active(&self, book_id: BookId, kind: JobKind) -> Option<GenerationJob>;

    /// 记一次工件尝试
    fn record_attempt(&self, job_id: Uuid, index: usize);

    /// 工件就绪（资产已落盘后调用）；超越后的迟到写入是 no-op
    fn artifact_ready(&self, job_id: Uuid, index: usize);

    /// 工件失败（仅该工件，Job 照常推进）
    fn artifact_failed(&self, job_id: Uuid, index: usize, error: String);

    /// 手动重试：重置槽位并重新入队，退避调度从头开始
    fn retry_artifact(&self, job_id: Uuid, index: usize) -> Result<(), JobError>;

    /// 清理某本书的全部 Job（删除图书时调用）
    fn remove_book_scope(&self, book_id: BookId);
}
