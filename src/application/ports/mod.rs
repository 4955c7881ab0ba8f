//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod analysis_provider;
mod asset_store;
mod current_book;
mod image_engine;
mod job_tracker;
mod portrait_cache;
mod repositories;
mod speech_engine;
mod text_extractor;

pub use analysis_provider::{
    AnalysisProviderError, AnalysisProviderPort, RawAnalysis, RawEntity, ScriptLine,
};
pub use asset_store::{AssetError, AssetStorePort};
pub use current_book::{CurrentBook, CurrentBookPort};
pub use image_engine::{ImageEngineError, ImageEnginePort, ImageRequest};
pub use job_tracker::{ArtifactOrder, JobError, JobTrackerPort};
pub use portrait_cache::{
    portrait_cache_key, PortraitCacheError, PortraitCachePort, PortraitKey, PortraitRecord,
};
pub use repositories::{BookRecord, BookRepositoryPort, LibraryOrder, RepositoryError};
pub use speech_engine::{SpeechEngineError, SpeechEnginePort, SpeechRequest, SpeechResponse};
pub use text_extractor::{ExtractedText, ExtractorError, ExtractRequest, TextExtractorPort};
