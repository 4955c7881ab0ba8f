//! Configuration - 配置模块
//!
//! 多源配置：默认值 < config.toml < 环境变量（BOOKVISION_ 前缀）

mod loader;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::{
    AnalysisConfig, AppConfig, DatabaseConfig, ExtractorConfig, GenerationConfig, ImagesConfig,
    LogConfig, RetryConfig, ServerConfig, SpeechConfig, StaticFilesConfig, StorageConfig,
};
