//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、JobTracker、各外部服务等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - prompts: 图像提示词模板
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod prompts;
pub mod queries;

// Re-exports
pub use commands::{
    // Book commands
    DeleteBook,
    IngestBook,
    LoadBook,
    // Generation commands
    GenerateAudio,
    GeneratePodcast,
    GenerateVisuals,
    RegeneratePortrait,
    RetryArtifact,
    // Handlers
    handlers::{
        AnalysisPipeline, AnalysisPipelineConfig, AudioJobResult, DeleteBookHandler,
        GenerateAudioHandler, GeneratePodcastHandler, GenerateVisualsHandler, IngestBookHandler,
        IngestResult, LoadBookHandler, PlaylistItem, PodcastJobResult, PortraitHandler,
        PortraitResult, RetryArtifactHandler, VisualsJobResult,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Analysis provider
    AnalysisProviderError,
    AnalysisProviderPort,
    RawAnalysis,
    RawEntity,
    ScriptLine,
    // Asset store
    AssetError,
    AssetStorePort,
    // Current book
    CurrentBook,
    CurrentBookPort,
    // Image engine
    ImageEngineError,
    ImageEnginePort,
    ImageRequest,
    // Job tracker
    ArtifactOrder,
    JobError,
    JobTrackerPort,
    // Portrait cache
    portrait_cache_key,
    PortraitCacheError,
    PortraitCachePort,
    PortraitKey,
    PortraitRecord,
    // Repositories
    BookRecord,
    BookRepositoryPort,
    LibraryOrder,
    RepositoryError,
    // Speech engine
    SpeechEngineError,
    SpeechEnginePort,
    SpeechRequest,
    SpeechResponse,
    // Text extractor
    ExtractedText,
    ExtractorError,
    ExtractRequest,
    TextExtractorPort,
};

pub use queries::{
    // Book queries
    GetEntityPortrait,
    GetJobStatus,
    GetStory,
    ListLibrary,
    // Q&A queries
    AskQuestion,
    SuggestQuestions,
    // Handlers
    handlers::{
        ArtifactView, AskQuestionHandler, GetJobStatusHandler, GetStoryHandler, JobStatusView,
        ListLibraryHandler, QaConfig, StoryView, SuggestQuestionsHandler,
    },
};
