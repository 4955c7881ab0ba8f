//! Analysis Provider Adapters

mod fake_analysis_client;
mod http_analysis_client;

pub use fake_analysis_client::FakeAnalysisClient;
pub use http_analysis_client::{HttpAnalysisClient, HttpAnalysisClientConfig};
