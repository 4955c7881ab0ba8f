//! Generation Context - 生成限界上下文
//!
//! 职责:
//! - GenerationJob 状态机（requested → running → partial → complete | failed）
//! - 工件槽位与重放所需的生成参数
//! - 几何退避重试调度

mod job;
mod retry;
mod voice;

pub use job::{ArtifactSlot, ArtifactSpec, ArtifactState, GenerationJob, JobKind, JobStatus};
pub use retry::RetryPolicy;
pub use voice::{resolve_host, HostProfile, SpeechProvider, VoiceSettings, PODCAST_HOSTS};
