//! Text Extractor Adapters

mod http_extractor_client;
mod plain_text_extractor;

pub use http_extractor_client::{HttpExtractorClient, HttpExtractorClientConfig};
pub use plain_text_extractor::PlainTextExtractor;
