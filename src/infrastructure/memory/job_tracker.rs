//! In-Memory Job Tracker Implementation
//!
//! 每个 (book, kind) 持有一个活动 Job 指针与单调递增的代号。
//! 同类新请求入场即超越旧 Job：worker 对旧工作单见到超越标记直接
//! 丢弃，对旧 Job 的迟到状态写回也在此判废，绝不触碰新 Job。

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::ports::{ArtifactOrder, JobError, JobTrackerPort};
use crate::domain::book::BookId;
use crate::domain::generation::{GenerationJob, JobKind};

/// 内存任务跟踪器
pub struct InMemoryJobTracker {
    /// job_id -> GenerationJob
    jobs: DashMap<Uuid, GenerationJob>,
    /// (book, kind) -> 活动 job_id
    active: DashMap<(BookId, JobKind), Uuid>,
    /// (book, kind) -> 已发出的最大代号
    generations: DashMap<(BookId, JobKind), u64>,
    /// 工作单队列发送端
    queue_sender: mpsc::Sender<ArtifactOrder>,
}

impl InMemoryJobTracker {
    pub fn new(queue_sender: mpsc::Sender<ArtifactOrder>) -> Self {
        Self {
            jobs: DashMap::new(),
            active: DashMap::new(),
            generations: DashMap::new(),
            queue_sender,
        }
    }

    pub fn arc(self) -> std::sync::Arc<Self> {
        std::sync::Arc::new(self)
    }

    fn make_order(job: &GenerationJob, index: usize) -> Option<ArtifactOrder> {
        let slot = job.artifact(index)?;
        Some(ArtifactOrder {
            job_id: job.id,
            book_id: job.book_id,
            kind: job.kind,
            generation: job.generation,
            index: slot.index,
            rel_path: slot.rel_path.clone(),
            spec: slot.spec.clone(),
        })
    }

    fn enqueue(&self, order: ArtifactOrder) -> Result<(), JobError> {
        let job_id = order.job_id;
        let index = order.index;
        self.queue_sender.try_send(order).map_err(|e| {
            tracing::warn!(job_id = %job_id, index = index, error = %e, "Failed to enqueue artifact order");
            JobError::QueueFull
        })
    }
}

impl JobTrackerPort for InMemoryJobTracker {
    fn submit(&self, mut job: GenerationJob) -> Result<GenerationJob, JobError> {
        let key = (job.book_id, job.kind);

        // 代号单调递增；迟到写回据此与活动指针双重判废
        let generation = {
            let mut entry = self.generations.entry(key).or_insert(0);
            *entry += 1;
            *entry
        };
        job.set_generation(generation);

        // 入场即超越：旧 Job 的后续结果全部作废
        if let Some(old_id) = self.active.insert(key, job.id) {
            tracing::info!(
                old_job_id = %old_id,
                new_job_id = %job.id,
                kind = job.kind.as_str(),
                "Job superseded by new request"
            );
        }

        let indices: Vec<usize> = (0..job.artifacts().len()).collect();
        job.mark_dispatched();

        let snapshot = job.clone();
        self.jobs.insert(job.id, job);

        for index in indices {
            if let Some(order) = Self::make_order(&snapshot, index) {
                if self.enqueue(order).is_err() {
                    // 队列满：该工件立即判失败并暴露手动重试，而不是永久 pending
                    if let Some(mut stored) = self.jobs.get_mut(&snapshot.id) {
                        stored.artifact_failed(index, "generation queue is full".to_string());
                    }
                }
            }
        }

        tracing::debug!(
            job_id = %snapshot.id,
            kind = snapshot.kind.as_str(),
            generation = generation,
            artifacts = snapshot.artifacts().len(),
            "Job submitted"
        );

        Ok(self.jobs.get(&snapshot.id).map(|j| j.clone()).unwrap_or(snapshot))
    }

    fn is_superseded(&self, job_id: Uuid) -> bool {
        let Some(job) = self.jobs.get(&job_id) else {
            // 不存在（已随书清理）的 Job 视为已超越
            return true;
        };
        self.active
            .get(&(job.book_id, job.kind))
            .map(|active_id| *active_id != job_id)
            .unwrap_or(true)
    }

    fn get(&self, job_id: Uuid) -> Option<GenerationJob> {
        self.jobs.get(&job_id).map(|j| j.clone())
    }

    fn active(&self, book_id: BookId, kind: JobKind) -> Option<GenerationJob> {
        let id = *self.active.get(&(book_id, kind))?;
        self.get(id)
    }

    fn record_attempt(&self, job_id: Uuid, index: usize) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.record_attempt(index);
        }
    }

    fn artifact_ready(&self, job_id: Uuid, index: usize) {
        if self.is_superseded(job_id) {
            tracing::debug!(job_id = %job_id, index = index, "Dropping late artifact result");
            return;
        }
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.artifact_ready(index);
            tracing::debug!(
                job_id = %job_id,
                index = index,
                status = job.status().as_str(),
                "Artifact ready"
            );
        }
    }

    fn artifact_failed(&self, job_id: Uuid, index: usize, error: String) {
        if self.is_superseded(job_id) {
            tracing::debug!(job_id = %job_id, index = index, "Dropping late artifact failure");
            return;
        }
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.artifact_failed(index, error);
            tracing::debug!(
                job_id = %job_id,
                index = index,
                status = job.status().as_str(),
                "Artifact failed"
            );
        }
    }

    fn retry_artifact(&self, job_id: Uuid, index: usize) -> Result<(), JobError> {
        if self.is_superseded(job_id) {
            return Err(JobError::NotFound(job_id));
        }

        let order = {
            let mut job = self.jobs.get_mut(&job_id).ok_or(JobError::NotFound(job_id))?;
            if job.reset_artifact(index).is_none() {
                return Err(JobError::ArtifactOutOfRange(index));
            }
            Self::make_order(&job, index).ok_or(JobError::ArtifactOutOfRange(index))?
        };

        self.enqueue(order)
    }

    fn remove_book_scope(&self, book_id: BookId) {
        let job_ids: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|e| e.book_id == book_id)
            .map(|e| e.id)
            .collect();

        for id in &job_ids {
            self.jobs.remove(id);
        }
        for kind in [JobKind::Audio, JobKind::Images, JobKind::Podcast] {
            self.active.remove(&(book_id, kind));
            self.generations.remove(&(book_id, kind));
        }

        if !job_ids.is_empty() {
            tracing::debug!(book_id = %book_id, count = job_ids.len(), "Book jobs cleaned up");
        }
    }
}
