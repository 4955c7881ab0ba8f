//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    AnalysisPipeline, AnalysisPipelineConfig, DeleteBookHandler, GenerateAudioHandler,
    GeneratePodcastHandler, GenerateVisualsHandler, IngestBookHandler, LoadBookHandler,
    PortraitHandler, RetryArtifactHandler,
    // Query handlers
    AskQuestionHandler, GetJobStatusHandler, GetStoryHandler, ListLibraryHandler, QaConfig,
    SuggestQuestionsHandler,
    // Ports
    AnalysisProviderPort, AssetStorePort, BookRepositoryPort, CurrentBookPort, ImageEnginePort,
    JobTrackerPort, PortraitCachePort, TextExtractorPort,
};
use crate::config::AppConfig;

/// 生成相关的请求缺省值（HTTP 层兜底用）
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    /// 插图缺省风格
    pub visual_style: String,
    /// 插图缺省种子（固定值保证可复现）
    pub visual_seed: u64,
    /// 头像缺省风格
    pub portrait_style: String,
    /// 书加载后预取头像的角色数
    pub portrait_prefetch: usize,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub current: Arc<dyn CurrentBookPort>,
    pub job_tracker: Arc<dyn JobTrackerPort>,
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub asset_store: Arc<dyn AssetStorePort>,

    // ========== Command Handlers ==========
    pub ingest_handler: IngestBookHandler,
    pub load_handler: LoadBookHandler,
    pub delete_handler: DeleteBookHandler,
    pub generate_audio_handler: GenerateAudioHandler,
    pub generate_visuals_handler: GenerateVisualsHandler,
    pub generate_podcast_handler: GeneratePodcastHandler,
    pub retry_artifact_handler: RetryArtifactHandler,
    pub portrait_handler: Arc<PortraitHandler>,

    // ========== Query Handlers ==========
    pub story_handler: GetStoryHandler,
    pub library_handler: ListLibraryHandler,
    pub job_status_handler: GetJobStatusHandler,
    pub ask_handler: AskQuestionHandler,
    pub suggest_handler: SuggestQuestionsHandler,

    // ========== Defaults ==========
    pub defaults: GenerationDefaults,
}

impl AppState {
    /// 创建应用状态
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &AppConfig,
        current: Arc<dyn CurrentBookPort>,
        job_tracker: Arc<dyn JobTrackerPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        portrait_cache: Arc<dyn PortraitCachePort>,
        asset_store: Arc<dyn AssetStorePort>,
        extractor: Arc<dyn TextExtractorPort>,
        analysis_provider: Arc<dyn AnalysisProviderPort>,
        image_engine: Arc<dyn ImageEnginePort>,
    ) -> Self {
        let pipeline = Arc::new(AnalysisPipeline::new(
            analysis_provider.clone(),
            AnalysisPipelineConfig {
                max_context_chars: config.analysis.analyze_context_chars,
                max_entities: config.analysis.max_entities,
            },
        ));

        let qa_config = QaConfig {
            context_chars: config.analysis.qa_context_chars,
            suggest_context_chars: config.analysis.suggest_context_chars,
            timeout: std::time::Duration::from_secs(config.analysis.qa_timeout_secs),
        };

        Self {
            // Ports
            current: current.clone(),
            job_tracker: job_tracker.clone(),
            book_repo: book_repo.clone(),
            asset_store: asset_store.clone(),

            // Command handlers
            ingest_handler: IngestBookHandler::new(
                extractor,
                pipeline,
                book_repo.clone(),
                asset_store.clone(),
                current.clone(),
            ),
            load_handler: LoadBookHandler::new(
                book_repo.clone(),
                asset_store.clone(),
                current.clone(),
            ),
            delete_handler: DeleteBookHandler::new(
                book_repo.clone(),
                asset_store.clone(),
                portrait_cache.clone(),
                job_tracker.clone(),
                current.clone(),
            ),
            generate_audio_handler: GenerateAudioHandler::new(
                current.clone(),
                job_tracker.clone(),
                asset_store.clone(),
                config.speech.max_chars,
            ),
            generate_visuals_handler: GenerateVisualsHandler::new(
                current.clone(),
                job_tracker.clone(),
                asset_store.clone(),
                config.images.max_scenes,
                config.images.cover_width,
                config.images.cover_height,
            ),
            generate_podcast_handler: GeneratePodcastHandler::new(
                current.clone(),
                analysis_provider.clone(),
                job_tracker.clone(),
                asset_store.clone(),
                config.analysis.script_context_chars,
            ),
            retry_artifact_handler: RetryArtifactHandler::new(job_tracker.clone()),
            portrait_handler: Arc::new(PortraitHandler::new(
                current.clone(),
                portrait_cache,
                image_engine,
                asset_store.clone(),
                config.images.portrait_size,
            )),

            // Query handlers
            story_handler: GetStoryHandler::new(current.clone()),
            library_handler: ListLibraryHandler::new(book_repo),
            job_status_handler: GetJobStatusHandler::new(job_tracker, asset_store),
            ask_handler: AskQuestionHandler::new(
                current.clone(),
                analysis_provider.clone(),
                qa_config.clone(),
            ),
            suggest_handler: SuggestQuestionsHandler::new(current, analysis_provider, qa_config),

            // Defaults
            defaults: GenerationDefaults {
                visual_style: config.images.default_style.clone(),
                visual_seed: config.images.default_seed,
                portrait_style: config.images.portrait_style.clone(),
                portrait_prefetch: config.images.portrait_prefetch,
            },
        }
    }
}
