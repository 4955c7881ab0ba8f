//! Book Query Handlers

use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AssetStorePort, BookRecord, BookRepositoryPort, CurrentBookPort, JobTrackerPort,
};
use crate::application::queries::{GetJobStatus, GetStory, ListLibrary};
use crate::domain::book::Entity;
use crate::domain::generation::{ArtifactState, JobKind, JobStatus};

// ============================================================================
// GetStory
// ============================================================================

/// 当前图书的正文视图
#[derive(Debug, Clone)]
pub struct StoryView {
    pub body: String,
    pub entities: Vec<Entity>,
}

/// GetStory Handler
pub struct GetStoryHandler {
    current: Arc<dyn CurrentBookPort>,
}

impl GetStoryHandler {
    pub fn new(current: Arc<dyn CurrentBookPort>) -> Self {
        Self { current }
    }

    pub async fn handle(&self, _query: GetStory) -> Result<StoryView, ApplicationError> {
        let current = self
            .current
            .get()
            .ok_or_else(|| ApplicationError::not_found("Book", "current"))?;

        Ok(StoryView {
            body: current.full_text.clone(),
            entities: current.analysis.entities.clone(),
        })
    }
}

// ============================================================================
// ListLibrary
// ============================================================================

/// ListLibrary Handler - 顺序由调用方指定
pub struct ListLibraryHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListLibraryHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: ListLibrary) -> Result<Vec<BookRecord>, ApplicationError> {
        Ok(self.book_repo.find_all(query.order).await?)
    }
}

// ============================================================================
// GetJobStatus
// ============================================================================

/// 工件视图
#[derive(Debug, Clone)]
pub struct ArtifactView {
    pub index: usize,
    pub url: String,
    pub state: ArtifactState,
    pub error: Option<String>,
    pub attempts: u32,
}

/// Job 状态视图 - 轮询协议的内部真源
#[derive(Debug, Clone)]
pub struct JobStatusView {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub error: Option<String>,
    /// 可按脚本顺序放行的前缀长度（播客播放用）
    pub playable_prefix: usize,
    pub artifacts: Vec<ArtifactView>,
}

/// GetJobStatus Handler
pub struct GetJobStatusHandler {
    job_tracker: Arc<dyn JobTrackerPort>,
    asset_store: Arc<dyn AssetStorePort>,
}

impl GetJobStatusHandler {
    pub fn new(job_tracker: Arc<dyn JobTrackerPort>, asset_store: Arc<dyn AssetStorePort>) -> Self {
        Self {
            job_tracker,
            asset_store,
        }
    }

    pub async fn handle(&self, query: GetJobStatus) -> Result<JobStatusView, ApplicationError> {
        let job = self
            .job_tracker
            .get(query.job_id)
            .ok_or_else(|| ApplicationError::not_found("Job", query.job_id))?;

        let artifacts = job
            .artifacts()
            .iter()
            .map(|slot| ArtifactView {
                index: slot.index,
                url: self.asset_store.public_url(&slot.rel_path),
                state: slot.state,
                error: slot.error.clone(),
                attempts: slot.attempts,
            })
            .collect();

        Ok(JobStatusView {
            job_id: job.id,
            kind: job.kind,
            status: job.status(),
            error: job.error(),
            playable_prefix: job.playable_prefix(),
            artifacts,
        })
    }
}
