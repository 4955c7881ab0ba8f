//! Command Handlers

mod analysis_pipeline;
mod book_handlers;
mod generation_handlers;
mod portrait_handlers;

pub use analysis_pipeline::{AnalysisPipeline, AnalysisPipelineConfig};
pub use book_handlers::{DeleteBookHandler, IngestBookHandler, IngestResult, LoadBookHandler};
pub use generation_handlers::{
    AudioJobResult, GenerateAudioHandler, GeneratePodcastHandler, GenerateVisualsHandler,
    PlaylistItem, PodcastJobResult, RetryArtifactHandler, VisualsJobResult,
};
pub use portrait_handlers::{PortraitHandler, PortraitResult};
