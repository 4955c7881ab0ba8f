//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量（前缀 `BOOKVISION_`，层级分隔符 `__`）
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `BOOKVISION_SERVER__PORT=8080`
/// - `BOOKVISION_ANALYSIS__URL=http://llm-gateway:8200`
/// - `BOOKVISION_SPEECH__MAX_CHARS=4000`
/// - `BOOKVISION_DATABASE__PATH=/data/bookvision.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 2. 环境变量（最高优先级）
    builder = builder.add_source(
        Environment::with_prefix("BOOKVISION")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // serde default 负责填充缺省值
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if !config.server.api_prefix.starts_with('/') || config.server.api_prefix == "/" {
        return Err(ConfigError::ValidationError(
            "API prefix must start with '/' and not be the bare root".to_string(),
        ));
    }

    if config.analysis.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Analysis service URL cannot be empty".to_string(),
        ));
    }

    if config.speech.max_chars == 0 {
        return Err(ConfigError::ValidationError(
            "speech.max_chars cannot be 0".to_string(),
        ));
    }

    if config.images.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "images.retry.max_attempts cannot be 0".to_string(),
        ));
    }

    if config.generation.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "generation.max_concurrent cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("API Prefix: {}", config.server.api_prefix);
    if config.extractor.url.is_empty() {
        tracing::info!("Extractor: local TXT only");
    } else {
        tracing::info!("Extractor URL: {}", config.extractor.url);
    }
    tracing::info!("Analysis URL: {}", config.analysis.url);
    tracing::info!("Speech URL: {}", config.speech.url);
    tracing::info!("Speech Max Chars: {}", config.speech.max_chars);
    tracing::info!("Images URL: {}", config.images.url);
    tracing::info!(
        "Images Retry: {} attempts, base {}ms, cap {}ms",
        config.images.retry.max_attempts,
        config.images.retry.base_delay_ms,
        config.images.retry.max_delay_ms
    );
    tracing::info!("Generation Concurrency: {}", config.generation.max_concurrent);
    tracing::info!("Assets Directory: {:?}", config.storage.assets_dir);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_prefix() {
        let mut config = AppConfig::default();
        config.server.api_prefix = "api".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_analysis_url() {
        let mut config = AppConfig::default();
        config.analysis.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_max_chars() {
        let mut config = AppConfig::default();
        config.speech.max_chars = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_retry_attempts() {
        let mut config = AppConfig::default();
        config.images.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }
}
