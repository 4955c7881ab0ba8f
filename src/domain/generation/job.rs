//! Generation Context - Job 状态机
//!
//! 一个 Job 覆盖一次生成请求的全部工件。工件槽位在受理时即规划完毕
//! （含最终落盘路径），之后各自独立异步就绪。状态由槽位推导:
//! requested → running → { partial → complete } | failed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VoiceSettings;
use crate::domain::book::BookId;

/// 生成工作流类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Audio,
    Images,
    Podcast,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Audio => "audio",
            JobKind::Images => "images",
            JobKind::Podcast => "podcast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(JobKind::Audio),
            "images" => Some(JobKind::Images),
            "podcast" => Some(JobKind::Podcast),
            _ => None,
        }
    }
}

/// 工件槽位状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    /// 等待生成
    Pending,
    /// 资产已落盘，location 可读
    Ready,
    /// 该工件失败（不影响其他工件）
    Failed,
}

/// 工件的生成参数 - 重试时据此重建工作单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactSpec {
    /// 有声书旁白（单工件）
    Narration { text: String, voice: VoiceSettings },
    /// 封面/场景图
    Image {
        prompt: String,
        style: String,
        seed: u64,
        width: u32,
        height: u32,
    },
    /// 播客片段（按脚本顺序）
    PodcastSegment {
        speaker: String,
        text: String,
        voice: VoiceSettings,
    },
}

/// 工件槽位
///
/// 不变量:
/// - index 在 Job 内唯一且有序
/// - rel_path 以 job 短名限定，超越的旧 Job 不会写入新 Job 的路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSlot {
    pub index: usize,
    /// 资产库内的相对路径（受理时即确定，先于内容存在）
    pub rel_path: String,
    pub spec: ArtifactSpec,
    pub state: ArtifactState,
    pub error: Option<String>,
    /// 已消耗的尝试次数
    pub attempts: u32,
}

impl ArtifactSlot {
    pub fn new(index: usize, rel_path: String, spec: ArtifactSpec) -> Self {
        Self {
            index,
            rel_path,
            spec,
            state: ArtifactState::Pending,
            error: None,
            attempts: 0,
        }
    }

    fn resolved(&self) -> bool {
        self.state != ArtifactState::Pending
    }
}

/// Job 整体状态（由槽位推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Requested,
    Running,
    Partial,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Requested => "requested",
            JobStatus::Running => "running",
            JobStatus::Partial => "partial",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

/// 生成任务
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: Uuid,
    pub book_id: BookId,
    pub kind: JobKind,
    /// (book, kind) 内单调递增的代号，迟到写入据此判废
    pub generation: u64,
    artifacts: Vec<ArtifactSlot>,
    /// 工作单是否已入队
    dispatched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(book_id: BookId, kind: JobKind, artifacts: Vec<ArtifactSlot>) -> Self {
        Self::new_with_id(Uuid::new_v4(), book_id, kind, artifacts)
    }

    /// 调用方先定 id 以便把工件路径限定在 job 作用域内
    pub fn new_with_id(
        id: Uuid,
        book_id: BookId,
        kind: JobKind,
        artifacts: Vec<ArtifactSlot>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            book_id,
            kind,
            generation: 0,
            artifacts,
            dispatched: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 由 tracker 在注册时赋予 (book, kind) 内单调递增的代号
    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn artifacts(&self) -> &[ArtifactSlot] {
        &self.artifacts
    }

    pub fn artifact(&self, index: usize) -> Option<&ArtifactSlot> {
        self.artifacts.get(index)
    }

    /// 工作单入队后调用，状态离开 requested
    pub fn mark_dispatched(&mut self) {
        self.dispatched = true;
        self.updated_at = Utc::now();
    }

    /// 记一次尝试
    pub fn record_attempt(&mut self, index: usize) {
        if let Some(slot) = self.artifacts.get_mut(index) {
            slot.attempts += 1;
            self.updated_at = Utc::now();
        }
    }

    /// 标记工件就绪（资产必须已落盘）
    pub fn artifact_ready(&mut self, index: usize) {
        if let Some(slot) = self.artifacts.get_mut(index) {
            slot.state = ArtifactState::Ready;
            slot.error = None;
            self.updated_at = Utc::now();
        }
    }

    /// 标记单个工件失败；其余工件不受影响
    pub fn artifact_failed(&mut self, index: usize, error: impl Into<String>) {
        if let Some(slot) = self.artifacts.get_mut(index) {
            slot.state = ArtifactState::Failed;
            slot.error = Some(error.into());
            self.updated_at = Utc::now();
        }
    }

    /// 重置槽位以便手动重试（退避调度从头开始）
    pub fn reset_artifact(&mut self, index: usize) -> Option<&ArtifactSlot> {
        let slot = self.artifacts.get_mut(index)?;
        slot.state = ArtifactState::Pending;
        slot.error = None;
        slot.attempts = 0;
        self.updated_at = Utc::now();
        self.artifacts.get(index)
    }

    /// 推导整体状态
    ///
    /// - failed: 所有工件都失败（整体不可用），需人类可读错误
    /// - complete: 无待生成工件且至少一个就绪（容忍个别失败 = 降级完成）
    /// - partial: 部分已决、部分待生成
    /// - running/requested: 尚无任何工件落定
    pub fn status(&self) -> JobStatus {
        if self.artifacts.is_empty() {
            return if self.dispatched {
                JobStatus::Running
            } else {
                JobStatus::Requested
            };
        }

        let ready = self
            .artifacts
            .iter()
            .filter(|a| a.state == ArtifactState::Ready)
            .count();
        let failed = self
            .artifacts
            .iter()
            .filter(|a| a.state == ArtifactState::Failed)
            .count();
        let pending = self.artifacts.len() - ready - failed;

        if failed == self.artifacts.len() {
            JobStatus::Failed
        } else if pending == 0 {
            JobStatus::Complete
        } else if ready + failed > 0 {
            JobStatus::Partial
        } else if self.dispatched {
            JobStatus::Running
        } else {
            JobStatus::Requested
        }
    }

    /// 整体失败时的人类可读错误
    pub fn error(&self) -> Option<String> {
        if self.status() != JobStatus::Failed {
            return None;
        }
        self.artifacts
            .iter()
            .find_map(|a| a.error.clone())
            .or_else(|| Some("generation failed".to_string()))
    }

    /// 可按序放行的前缀长度
    ///
    /// 播放顺序必须等于脚本顺序: 乱序完成的片段在此缓冲，直到它前面的
    /// 每个片段都已落定（就绪或失败跳过）才计入前缀。
    pub fn playable_prefix(&self) -> usize {
        self.artifacts
            .iter()
            .take_while(|a| a.resolved())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_spec(i: usize) -> ArtifactSpec {
        ArtifactSpec::Image {
            prompt: format!("scene {}", i),
            style: "storybook".to_string(),
            seed: 42,
            width: 1280,
            height: 720,
        }
    }

    fn job_with_slots(n: usize) -> GenerationJob {
        let slots = (0..n)
            .map(|i| ArtifactSlot::new(i, format!("visuals/test/img_{:02}.jpg", i), image_spec(i)))
            .collect();
        GenerationJob::new(BookId::new(), JobKind::Images, slots)
    }

    #[test]
    fn test_status_lifecycle() {
        let mut job = job_with_slots(3);
        assert_eq!(job.status(), JobStatus::Requested);

        job.mark_dispatched();
        assert_eq!(job.status(), JobStatus::Running);

        job.artifact_ready(1);
        assert_eq!(job.status(), JobStatus::Partial);

        job.artifact_ready(0);
        job.artifact_ready(2);
        assert_eq!(job.status(), JobStatus::Complete);
        assert!(job.status().is_terminal());
    }

    #[test]
    fn test_degraded_complete_with_failed_artifact() {
        let mut job = job_with_slots(3);
        job.mark_dispatched();
        job.artifact_ready(0);
        job.artifact_failed(1, "provider timeout");
        job.artifact_ready(2);

        // 个别失败不阻塞整体完成
        assert_eq!(job.status(), JobStatus::Complete);
        assert_eq!(job.artifact(1).unwrap().state, ArtifactState::Failed);
    }

    #[test]
    fn test_all_failed_is_job_failure_with_error() {
        let mut job = job_with_slots(2);
        job.mark_dispatched();
        job.artifact_failed(0, "timeout");
        job.artifact_failed(1, "timeout");

        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().is_some());
    }

    #[test]
    fn test_playable_prefix_buffers_out_of_order_completion() {
        let mut job = job_with_slots(4);
        job.mark_dispatched();

        // 片段 3 先完成: 前缀不动
        job.artifact_ready(3);
        assert_eq!(job.playable_prefix(), 0);

        job.artifact_ready(0);
        assert_eq!(job.playable_prefix(), 1);

        job.artifact_ready(1);
        assert_eq!(job.playable_prefix(), 2);

        // 片段 2 失败 = 跳过，前缀一次放行到末尾
        job.artifact_failed(2, "synthesis failed");
        assert_eq!(job.playable_prefix(), 4);
    }

    #[test]
    fn test_reset_artifact_for_manual_retry() {
        let mut job = job_with_slots(2);
        job.mark_dispatched();
        job.record_attempt(0);
        job.record_attempt(0);
        job.artifact_failed(0, "exhausted");

        let slot = job.reset_artifact(0).unwrap();
        assert_eq!(slot.state, ArtifactState::Pending);
        assert_eq!(slot.attempts, 0);
        assert!(slot.error.is_none());
    }
}
