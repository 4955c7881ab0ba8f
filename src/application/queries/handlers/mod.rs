//! Query Handlers

mod book_handlers;
mod qa_handlers;

pub use book_handlers::{
    ArtifactView, GetJobStatusHandler, GetStoryHandler, JobStatusView, ListLibraryHandler,
    StoryView,
};
pub use qa_handlers::{AskQuestionHandler, QaConfig, SuggestQuestionsHandler};
