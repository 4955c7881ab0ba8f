//! Generation Commands

use uuid::Uuid;

use crate::domain::generation::VoiceSettings;

/// 生成有声书旁白命令（单工件）
#[derive(Debug, Clone)]
pub struct GenerateAudio {
    /// 待朗读文本；超出成本上界的部分会被显式截断
    pub text: String,
    pub voice: VoiceSettings,
}

/// 生成插图集命令（index 0 为封面，1..N 为场景图）
#[derive(Debug, Clone)]
pub struct GenerateVisuals {
    pub style: String,
    pub seed: u64,
}

/// 生成播客命令（脚本 + 逐段合成）
#[derive(Debug, Clone)]
pub struct GeneratePodcast {
    pub provider: crate::domain::generation::SpeechProvider,
}

/// 手动重试单个工件（重置退避调度）
#[derive(Debug, Clone)]
pub struct RetryArtifact {
    pub job_id: Uuid,
    pub index: usize,
}

/// 显式重新生成角色头像（缓存打穿，版本 +1）
#[derive(Debug, Clone)]
pub struct RegeneratePortrait {
    pub entity_name: String,
    pub role: String,
    pub style: String,
}
