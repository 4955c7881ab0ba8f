//! Generation Command Handlers - 生成编排
//!
//! 三条生成工作流的受理端：在请求线程内规划全部工件位置并注册 Job，
//! 立即返回 location；真正的生成由后台 worker 异步完成，调用方按
//! 轮询协议发现就绪。

use std::sync::Arc;

use uuid::Uuid;

use crate::application::commands::{
    GenerateAudio, GeneratePodcast, GenerateVisuals, RetryArtifact,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{AssetStorePort, CurrentBookPort, JobTrackerPort};
use crate::application::prompts;
use crate::domain::excerpt;
use crate::domain::generation::{
    resolve_host, ArtifactSlot, ArtifactSpec, GenerationJob, JobKind,
};

/// 工件路径中使用的 job 短名 - 路径随 job 走，超越后的旧 job
/// 迟到落盘不会覆盖新 job 的位置
fn job_scope(job_id: &Uuid) -> String {
    job_id.simple().to_string()[..8].to_string()
}

// ============================================================================
// GenerateAudio
// ============================================================================

/// 有声书生成受理结果
#[derive(Debug, Clone)]
pub struct AudioJobResult {
    pub job_id: Uuid,
    pub audio_url: String,
    /// 实际送入合成的字符数（截断是显式契约，不是静默丢失）
    pub chars_used: usize,
    pub truncated: bool,
}

/// GenerateAudio Handler - 单工件工作流
pub struct GenerateAudioHandler {
    current: Arc<dyn CurrentBookPort>,
    job_tracker: Arc<dyn JobTrackerPort>,
    asset_store: Arc<dyn AssetStorePort>,
    /// 合成文本的成本上界（字符）
    max_chars: usize,
}

impl GenerateAudioHandler {
    pub fn new(
        current: Arc<dyn CurrentBookPort>,
        job_tracker: Arc<dyn JobTrackerPort>,
        asset_store: Arc<dyn AssetStorePort>,
        max_chars: usize,
    ) -> Self {
        Self {
            current,
            job_tracker,
            asset_store,
            max_chars,
        }
    }

    pub async fn handle(&self, command: GenerateAudio) -> Result<AudioJobResult, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;

        if command.text.trim().is_empty() {
            return Err(ApplicationError::validation("text is required"));
        }

        let total_chars = command.text.chars().count();
        let narration = excerpt(&command.text, self.max_chars).to_string();
        let chars_used = narration.chars().count();
        let truncated = chars_used < total_chars;

        let job_id = Uuid::new_v4();
        let rel_path = format!(
            "{}/audio/{}/audiobook.mp3",
            current.book.id(),
            job_scope(&job_id)
        );

        let slot = ArtifactSlot::new(
            0,
            rel_path.clone(),
            ArtifactSpec::Narration {
                text: narration,
                voice: command.voice,
            },
        );

        let job = GenerationJob::new_with_id(job_id, current.book.id(), JobKind::Audio, vec![slot]);
        self.job_tracker.submit(job)?;

        tracing::info!(
            job_id = %job_id,
            book_id = %current.book.id(),
            chars_used = chars_used,
            truncated = truncated,
            "Audio generation accepted"
        );

        Ok(AudioJobResult {
            job_id,
            audio_url: self.asset_store.public_url(&rel_path),
            chars_used,
            truncated,
        })
    }
}

// ============================================================================
// GenerateVisuals
// ============================================================================

/// 插图集生成受理结果 - location 先于内容存在
#[derive(Debug, Clone)]
pub struct VisualsJobResult {
    pub job_id: Uuid,
    /// index 0 为封面，其余为场景图
    pub images: Vec<String>,
}

/// GenerateVisuals Handler - 多工件并发工作流
pub struct GenerateVisualsHandler {
    current: Arc<dyn CurrentBookPort>,
    job_tracker: Arc<dyn JobTrackerPort>,
    asset_store: Arc<dyn AssetStorePort>,
    /// 场景图数量上限
    max_scenes: usize,
    cover_width: u32,
    cover_height: u32,
}

impl GenerateVisualsHandler {
    pub fn new(
        current: Arc<dyn CurrentBookPort>,
        job_tracker: Arc<dyn JobTrackerPort>,
        asset_store: Arc<dyn AssetStorePort>,
        max_scenes: usize,
        cover_width: u32,
        cover_height: u32,
    ) -> Self {
        Self {
            current,
            job_tracker,
            asset_store,
            max_scenes,
            cover_width,
            cover_height,
        }
    }

    pub async fn handle(
        &self,
        command: GenerateVisuals,
    ) -> Result<VisualsJobResult, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;
        let book_id = current.book.id();
        let job_id = Uuid::new_v4();
        let scope = job_scope(&job_id);

        let character_context = current.analysis.character_context();
        let mut slots = Vec::new();

        // index 0 固定为封面
        slots.push(ArtifactSlot::new(
            0,
            format!("{}/visuals/{}/image_00_cover.jpg", book_id, scope),
            ArtifactSpec::Image {
                prompt: prompts::cover_prompt(current.book.title().as_str(), &command.style),
                style: command.style.clone(),
                seed: command.seed,
                width: self.cover_width,
                height: self.cover_height,
            },
        ));

        // 场景图各自独立异步就绪，完成顺序不保证
        for (i, scene) in current
            .analysis
            .scenes
            .iter()
            .take(self.max_scenes)
            .enumerate()
        {
            slots.push(ArtifactSlot::new(
                i + 1,
                format!("{}/visuals/{}/image_01_scene_{:02}.jpg", book_id, scope, i + 1),
                ArtifactSpec::Image {
                    prompt: prompts::scene_prompt(scene, &character_context, &command.style),
                    style: command.style.clone(),
                    // 场景图种子沿用 seed 偏移，保持整组可复现
                    seed: command.seed + 200 + i as u64,
                    width: self.cover_width,
                    height: self.cover_height,
                },
            ));
        }

        let images = slots
            .iter()
            .map(|s| self.asset_store.public_url(&s.rel_path))
            .collect();

        let job = GenerationJob::new_with_id(job_id, book_id, JobKind::Images, slots);
        let job = self.job_tracker.submit(job)?;

        tracing::info!(
            job_id = %job.id,
            book_id = %book_id,
            artifacts = job.artifacts().len(),
            style = %command.style,
            seed = command.seed,
            "Visuals generation accepted"
        );

        Ok(VisualsJobResult { job_id, images })
    }
}

// ============================================================================
// GeneratePodcast
// ============================================================================

/// 播放列表条目 - 顺序即脚本顺序
#[derive(Debug, Clone)]
pub struct PlaylistItem {
    pub speaker: String,
    pub text: String,
    pub url: String,
}

/// 播客生成受理结果
#[derive(Debug, Clone)]
pub struct PodcastJobResult {
    pub job_id: Uuid,
    pub playlist: Vec<PlaylistItem>,
}

/// GeneratePodcast Handler - 脚本在受理线程内生成，逐段合成交给 worker
pub struct GeneratePodcastHandler {
    current: Arc<dyn CurrentBookPort>,
    provider: Arc<dyn crate::application::ports::AnalysisProviderPort>,
    job_tracker: Arc<dyn JobTrackerPort>,
    asset_store: Arc<dyn AssetStorePort>,
    /// 送入脚本生成的最大字符数
    script_context_chars: usize,
}

impl GeneratePodcastHandler {
    pub fn new(
        current: Arc<dyn CurrentBookPort>,
        provider: Arc<dyn crate::application::ports::AnalysisProviderPort>,
        job_tracker: Arc<dyn JobTrackerPort>,
        asset_store: Arc<dyn AssetStorePort>,
        script_context_chars: usize,
    ) -> Self {
        Self {
            current,
            provider,
            job_tracker,
            asset_store,
            script_context_chars,
        }
    }

    pub async fn handle(
        &self,
        command: GeneratePodcast,
    ) -> Result<PodcastJobResult, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;
        let book_id = current.book.id();

        let context = format!(
            "{}\n\n{}",
            current.analysis.summary,
            excerpt(&current.full_text, self.script_context_chars)
        );

        let script = self.provider.podcast_script(&context).await?;
        if script.is_empty() {
            return Err(ApplicationError::Generation(
                "podcast script is empty".to_string(),
            ));
        }

        let job_id = Uuid::new_v4();
        let scope = job_scope(&job_id);
        let mut slots = Vec::with_capacity(script.len());
        let mut playlist = Vec::with_capacity(script.len());

        for (i, line) in script.into_iter().enumerate() {
            // 未知 speaker 回落到第一位主持人
            let host = resolve_host(&line.speaker);
            let rel_path = format!(
                "{}/podcast/{}/seg_{:03}_{}.mp3",
                book_id, scope, i, host.name
            );

            playlist.push(PlaylistItem {
                speaker: host.name.to_string(),
                text: line.text.clone(),
                url: self.asset_store.public_url(&rel_path),
            });

            slots.push(ArtifactSlot::new(
                i,
                rel_path,
                ArtifactSpec::PodcastSegment {
                    speaker: host.name.to_string(),
                    text: line.text,
                    voice: host.voice(command.provider),
                },
            ));
        }

        let job = GenerationJob::new_with_id(job_id, book_id, JobKind::Podcast, slots);
        self.job_tracker.submit(job)?;

        tracing::info!(
            job_id = %job_id,
            book_id = %book_id,
            segments = playlist.len(),
            "Podcast generation accepted"
        );

        Ok(PodcastJobResult { job_id, playlist })
    }
}

// ============================================================================
// RetryArtifact
// ============================================================================

/// RetryArtifact Handler - 轮询耗尽后的手动重试入口
pub struct RetryArtifactHandler {
    job_tracker: Arc<dyn JobTrackerPort>,
}

impl RetryArtifactHandler {
    pub fn new(job_tracker: Arc<dyn JobTrackerPort>) -> Self {
        Self { job_tracker }
    }

    pub async fn handle(&self, command: RetryArtifact) -> Result<(), ApplicationError> {
        self.job_tracker
            .retry_artifact(command.job_id, command.index)?;

        tracing::info!(
            job_id = %command.job_id,
            index = command.index,
            "Artifact retry scheduled"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AnalysisProviderError, AnalysisProviderPort, AssetError, CurrentBook, RawAnalysis,
        ScriptLine,
    };
    use crate::domain::book::{Analysis, Book, BookFormat, BookId, Entity, Title};
    use crate::domain::generation::{SpeechProvider, VoiceSettings};
    use crate::infrastructure::memory::InMemoryJobTracker;
    use async_trait::async_trait;
    use std::sync::RwLock;
    use tokio::sync::mpsc;

    struct StubCurrent(RwLock<Option<Arc<CurrentBook>>>);

    impl crate::application::ports::CurrentBookPort for StubCurrent {
        fn set(&self, book: Arc<CurrentBook>) {
            *self.0.write().unwrap() = Some(book);
        }

        fn get(&self) -> Option<Arc<CurrentBook>> {
            self.0.read().unwrap().clone()
        }

        fn clear_if(&self, book_id: BookId) {
            let mut slot = self.0.write().unwrap();
            if slot.as_ref().map(|c| c.book.id()) == Some(book_id) {
                *slot = None;
            }
        }
    }

    struct NullAssets;

    #[async_trait]
    impl AssetStorePort for NullAssets {
        async fn write(&self, _rel_path: &str, _data: &[u8]) -> Result<(), AssetError> {
            Ok(())
        }

        async fn exists(&self, _rel_path: &str) -> bool {
            false
        }

        async fn read(&self, rel_path: &str) -> Result<Vec<u8>, AssetError> {
            Err(AssetError::NotFound(rel_path.to_string()))
        }

        async fn remove_book_scope(&self, _book_id: BookId) -> Result<(), AssetError> {
            Ok(())
        }

        fn public_url(&self, rel_path: &str) -> String {
            format!("/api/assets/{}", rel_path)
        }
    }

    struct ScriptProvider(Vec<ScriptLine>);

    #[async_trait]
    impl AnalysisProviderPort for ScriptProvider {
        async fn analyze(&self, _text: &str) -> Result<RawAnalysis, AnalysisProviderError> {
            unimplemented!()
        }

        async fn answer(&self, _c: &str, _q: &str) -> Result<String, AnalysisProviderError> {
            unimplemented!()
        }

        async fn suggest_questions(&self, _c: &str) -> Result<Vec<String>, AnalysisProviderError> {
            unimplemented!()
        }

        async fn podcast_script(&self, _c: &str) -> Result<Vec<ScriptLine>, AnalysisProviderError> {
            Ok(self.0.clone())
        }
    }

    fn current_with_scenes(scenes: Vec<String>) -> Arc<StubCurrent> {
        let book = Book::new(
            Title::new("Moby Dick").unwrap(),
            "Melville",
            "moby.txt",
            BookFormat::Txt,
            std::path::PathBuf::from("x/book.txt"),
            10,
        );
        let analysis = Analysis::new(
            "A whale hunt.".to_string(),
            vec![Entity::new("Ahab", "captain")],
            scenes,
            vec![],
            vec![],
            10,
        );
        let current = Arc::new(StubCurrent(RwLock::new(None)));
        use crate::application::ports::CurrentBookPort;
        current.set(Arc::new(CurrentBook::new(
            book,
            analysis,
            "Call me Ishmael.".to_string(),
        )));
        current
    }

    /// 返回接收端一并持有，避免队列被判关闭
    fn tracker() -> (
        Arc<InMemoryJobTracker>,
        mpsc::Receiver<crate::application::ports::ArtifactOrder>,
    ) {
        let (tx, rx) = mpsc::channel(64);
        (InMemoryJobTracker::new(tx).arc(), rx)
    }

    #[tokio::test]
    async fn test_audio_truncation_is_explicit() {
        let (jobs, _rx) = tracker();
        let handler = GenerateAudioHandler::new(
            current_with_scenes(vec![]),
            jobs,
            Arc::new(NullAssets),
            2_000,
        );

        let long_text: String = "a".repeat(5_000);
        let result = handler
            .handle(GenerateAudio {
                text: long_text,
                voice: VoiceSettings::default(),
            })
            .await
            .unwrap();

        assert_eq!(result.chars_used, 2_000);
        assert!(result.truncated);
        assert!(result.audio_url.ends_with("audiobook.mp3"));
    }

    #[tokio::test]
    async fn test_audio_short_text_not_truncated() {
        let (jobs, _rx) = tracker();
        let handler = GenerateAudioHandler::new(
            current_with_scenes(vec![]),
            jobs,
            Arc::new(NullAssets),
            2_000,
        );

        let result = handler
            .handle(GenerateAudio {
                text: "short narration".to_string(),
                voice: VoiceSettings::default(),
            })
            .await
            .unwrap();

        assert_eq!(result.chars_used, 15);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_audio_requires_current_book() {
        let (jobs, _rx) = tracker();
        let handler = GenerateAudioHandler::new(
            Arc::new(StubCurrent(RwLock::new(None))),
            jobs,
            Arc::new(NullAssets),
            2_000,
        );

        let result = handler
            .handle(GenerateAudio {
                text: "text".to_string(),
                voice: VoiceSettings::default(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NoContext)));
    }

    #[tokio::test]
    async fn test_visuals_locations_returned_immediately() {
        let (jobs, _rx) = tracker();
        let handler = GenerateVisualsHandler::new(
            current_with_scenes(vec![
                "A ship at sea".to_string(),
                "A white whale breaches".to_string(),
            ]),
            jobs.clone(),
            Arc::new(NullAssets),
            5,
            1280,
            720,
        );

        let result = handler
            .handle(GenerateVisuals {
                style: "storybook".to_string(),
                seed: 42,
            })
            .await
            .unwrap();

        // 封面 + 两张场景图，location 在内容存在之前即返回
        assert_eq!(result.images.len(), 3);
        assert!(result.images[0].contains("image_00_cover"));
        assert!(result.images[1].contains("scene_01"));

        let job = jobs.get(result.job_id).unwrap();
        assert_eq!(job.artifacts().len(), 3);
        // 场景种子沿用固定偏移，整组可复现
        match &job.artifacts()[1].spec {
            ArtifactSpec::Image { seed, .. } => assert_eq!(*seed, 42 + 200),
            other => panic!("unexpected spec: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_visuals_scene_count_is_capped() {
        let scenes = (0..10).map(|i| format!("Scene {}", i)).collect();
        let (jobs, _rx) = tracker();
        let handler = GenerateVisualsHandler::new(
            current_with_scenes(scenes),
            jobs,
            Arc::new(NullAssets),
            5,
            1280,
            720,
        );

        let result = handler
            .handle(GenerateVisuals {
                style: "manga".to_string(),
                seed: 7,
            })
            .await
            .unwrap();

        // 1 封面 + 最多 5 场景
        assert_eq!(result.images.len(), 6);
    }

    #[tokio::test]
    async fn test_podcast_unknown_speaker_falls_back_to_first_host() {
        let provider = ScriptProvider(vec![
            ScriptLine {
                speaker: "Emma".to_string(),
                text: "Welcome back!".to_string(),
            },
            ScriptLine {
                speaker: "Mystery Guest".to_string(),
                text: "Hello there.".to_string(),
            },
        ]);
        let (jobs, _rx) = tracker();
        let handler = GeneratePodcastHandler::new(
            current_with_scenes(vec![]),
            Arc::new(provider),
            jobs,
            Arc::new(NullAssets),
            12_000,
        );

        let result = handler
            .handle(GeneratePodcast {
                provider: SpeechProvider::Deepgram,
            })
            .await
            .unwrap();

        assert_eq!(result.playlist.len(), 2);
        assert_eq!(result.playlist[0].speaker, "Emma");
        // 未知 speaker 回落到第一位主持人
        assert_eq!(result.playlist[1].speaker, "Jax");
        // 播放列表顺序即脚本顺序
        assert!(result.playlist[0].url.contains("seg_000"));
        assert!(result.playlist[1].url.contains("seg_001"));
    }

    #[tokio::test]
    async fn test_podcast_empty_script_is_generation_error() {
        let (jobs, _rx) = tracker();
        let handler = GeneratePodcastHandler::new(
            current_with_scenes(vec![]),
            Arc::new(ScriptProvider(vec![])),
            jobs,
            Arc::new(NullAssets),
            12_000,
        );

        let result = handler
            .handle(GeneratePodcast {
                provider: SpeechProvider::Deepgram,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Generation(_))));
    }
}
