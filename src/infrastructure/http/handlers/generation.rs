//! Generation HTTP Handlers - 三条生成工作流 + 状态查询 + 手动重试

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    GenerateAudio, GeneratePodcast, GenerateVisuals, GetJobStatus, RetryArtifact,
};
use crate::domain::generation::{SpeechProvider, VoiceSettings};
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateAudioRequest {
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub stability: Option<f32>,
    #[serde(default)]
    pub similarity_boost: Option<f32>,
    #[serde(default)]
    pub provider: Option<SpeechProvider>,
}

#[derive(Debug, Serialize)]
pub struct GenerateAudioResponse {
    pub job_id: Uuid,
    pub audio_url: String,
    /// 实际合成的字符数；截断是显式契约
    pub chars_used: usize,
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateVisualsRequest {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// location 先于内容存在；就绪与否按 §轮询协议探测或查 status
#[derive(Debug, Serialize)]
pub struct GenerateVisualsResponse {
    pub job_id: Uuid,
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GeneratePodcastRequest {
    #[serde(default)]
    pub provider: Option<SpeechProvider>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistItemResponse {
    pub speaker: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratePodcastResponse {
    pub job_id: Uuid,
    pub playlist: Vec<PlaylistItemResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RetryArtifactRequest {
    pub job_id: Uuid,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtifactStatusResponse {
    pub index: usize,
    pub url: String,
    pub state: String,
    pub error: Option<String>,
    pub attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub kind: String,
    pub status: String,
    pub error: Option<String>,
    pub playable_prefix: usize,
    pub artifacts: Vec<ArtifactStatusResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// 生成有声书旁白
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateAudioRequest>,
) -> Result<Json<ApiResponse<GenerateAudioResponse>>, ApiError> {
    let mut voice = VoiceSettings::default();
    if let Some(voice_id) = req.voice_id {
        voice.voice_id = voice_id;
    }
    if let Some(stability) = req.stability {
        voice.stability = stability;
    }
    if let Some(similarity_boost) = req.similarity_boost {
        voice.similarity_boost = similarity_boost;
    }
    if let Some(provider) = req.provider {
        voice.provider = provider;
    }

    let result = state
        .generate_audio_handler
        .handle(GenerateAudio {
            text: req.text,
            voice,
        })
        .await?;

    Ok(Json(ApiResponse::success(GenerateAudioResponse {
        job_id: result.job_id,
        audio_url: result.audio_url,
        chars_used: result.chars_used,
        truncated: result.truncated,
    })))
}

/// 生成插图集（立即返回全部 location）
pub async fn generate_visuals(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateVisualsRequest>,
) -> Result<Json<ApiResponse<GenerateVisualsResponse>>, ApiError> {
    let style = req
        .style
        .unwrap_or_else(|| state.defaults.visual_style.clone());
    let seed = req.seed.unwrap_or(state.defaults.visual_seed);

    let result = state
        .generate_visuals_handler
        .handle(GenerateVisuals { style, seed })
        .await?;

    Ok(Json(ApiResponse::success(GenerateVisualsResponse {
        job_id: result.job_id,
        images: result.images,
    })))
}

/// 生成播客（返回带 URL 的顺序播放列表）
pub async fn generate_podcast(
    State(state): State<Arc<AppState>>,
    req: Option<Json<GeneratePodcastRequest>>,
) -> Result<Json<ApiResponse<GeneratePodcastResponse>>, ApiError> {
    let provider = req
        .and_then(|Json(r)| r.provider)
        .unwrap_or_default();

    let result = state
        .generate_podcast_handler
        .handle(GeneratePodcast { provider })
        .await?;

    let playlist = result
        .playlist
        .into_iter()
        .map(|item| PlaylistItemResponse {
            speaker: item.speaker,
            text: item.text,
            url: item.url,
        })
        .collect();

    Ok(Json(ApiResponse::success(GeneratePodcastResponse {
        job_id: result.job_id,
        playlist,
    })))
}

/// 手动重试单个工件（轮询耗尽后的恢复入口）
pub async fn retry_artifact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetryArtifactRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .retry_artifact_handler
        .handle(RetryArtifact {
            job_id: req.job_id,
            index: req.index,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 按 id 查询 Job 状态
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobStatusResponse>>, ApiError> {
    let view = state.job_status_handler.handle(GetJobStatus { job_id }).await?;

    let artifacts = view
        .artifacts
        .into_iter()
        .map(|a| ArtifactStatusResponse {
            index: a.index,
            url: a.url,
            state: match a.state {
                crate::domain::generation::ArtifactState::Pending => "pending",
                crate::domain::generation::ArtifactState::Ready => "ready",
                crate::domain::generation::ArtifactState::Failed => "failed",
            }
            .to_string(),
            error: a.error,
            attempts: a.attempts,
        })
        .collect();

    Ok(Json(ApiResponse::success(JobStatusResponse {
        job_id: view.job_id,
        kind: view.kind.as_str().to_string(),
        status: view.status.as_str().to_string(),
        error: view.error,
        playable_prefix: view.playable_prefix,
        artifacts,
    })))
}
