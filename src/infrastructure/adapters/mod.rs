//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现：四个外部服务客户端 + 文件资产库

pub mod analysis;
pub mod extractor;
pub mod image;
pub mod speech;
pub mod storage;

pub use analysis::{FakeAnalysisClient, HttpAnalysisClient, HttpAnalysisClientConfig};
pub use extractor::{HttpExtractorClient, HttpExtractorClientConfig, PlainTextExtractor};
pub use image::{FakeImageClient, HttpImageClient, HttpImageClientConfig};
pub use speech::{FakeSpeechClient, HttpSpeechClient, HttpSpeechClientConfig};
pub use storage::FileAssetStore;
