//! Generation Context - Voice Settings & Podcast Hosts

use serde::{Deserialize, Serialize};

/// 语音合成服务商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    Deepgram,
    ElevenLabs,
    /// 内置兜底（免费 TTS）
    Inbuilt,
}

impl Default for SpeechProvider {
    fn default() -> Self {
        SpeechProvider::Deepgram
    }
}

impl SpeechProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechProvider::Deepgram => "deepgram",
            SpeechProvider::ElevenLabs => "elevenlabs",
            SpeechProvider::Inbuilt => "inbuilt",
        }
    }
}

/// 语音合成参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// 服务商侧音色 ID
    pub voice_id: String,
    /// 稳定度 (0.0 - 1.0)
    pub stability: f32,
    /// 相似度增强 (0.0 - 1.0)
    pub similarity_boost: f32,
    /// 风格强度 (0.0 - 1.0)
    pub style: f32,
    /// 服务商选择
    pub provider: SpeechProvider,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            // Rachel
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            provider: SpeechProvider::default(),
        }
    }
}

/// 播客主持人档案
#[derive(Debug, Clone, Copy)]
pub struct HostProfile {
    pub name: &'static str,
    pub voice_id: &'static str,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
}

impl HostProfile {
    /// 主持人在指定服务商下的合成参数
    pub fn voice(&self, provider: SpeechProvider) -> VoiceSettings {
        VoiceSettings {
            voice_id: self.voice_id.to_string(),
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            provider,
        }
    }
}

/// 固定的双主持人阵容
///
/// 脚本中的 speaker 必须落在这两位之内；未知 speaker 回落到第一位。
pub const PODCAST_HOSTS: &[HostProfile] = &[
    HostProfile {
        name: "Jax",
        // Adam
        voice_id: "pNInz6obpgDQGcFmaJgB",
        stability: 0.4,
        similarity_boost: 0.8,
        style: 0.6,
    },
    HostProfile {
        name: "Emma",
        // Rachel
        voice_id: "21m00Tcm4TlvDq8ikWAM",
        stability: 0.6,
        similarity_boost: 0.75,
        style: 0.2,
    },
];

/// 按名字查找主持人；未知名字回落到第一位
pub fn resolve_host(name: &str) -> &'static HostProfile {
    PODCAST_HOSTS
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .unwrap_or(&PODCAST_HOSTS[0])
}
