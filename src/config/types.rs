//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::generation::RetryPolicy;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 文本提取服务配置
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// 语义分析服务配置
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// 语音合成服务配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 图像生成服务配置
    #[serde(default)]
    pub images: ImagesConfig,

    /// 生成 worker 配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（未设置时用 http://{host}:{port}）
    #[serde(default)]
    pub base_url: Option<String>,

    /// API 路径前缀
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5090
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            api_prefix: default_api_prefix(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }

    /// 资产路由的 URL 前缀
    pub fn assets_prefix(&self) -> String {
        format!("{}/assets", self.api_prefix.trim_end_matches('/'))
    }
}

/// 静态文件服务配置（前端 dashboard）
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default)]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_static_dir(),
        }
    }
}

/// 文本提取服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// 提取服务 URL；留空则退化为仅支持 TXT 的本地提取
    #[serde(default)]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_extractor_timeout")]
    pub timeout_secs: u64,
}

fn default_extractor_timeout() -> u64 {
    300
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_extractor_timeout(),
        }
    }
}

/// 语义分析服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// 分析服务基础 URL
    #[serde(default = "default_analysis_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default = "default_analysis_retries")]
    pub max_retries: u32,

    /// 语义分析的上下文上限（字符）
    #[serde(default = "default_analyze_chars")]
    pub analyze_context_chars: usize,

    /// 角色数量上限
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,

    /// 问答上下文上限（字符）
    #[serde(default = "default_qa_chars")]
    pub qa_context_chars: usize,

    /// 建议问题上下文上限（字符）
    #[serde(default = "default_suggest_chars")]
    pub suggest_context_chars: usize,

    /// 问答硬超时（秒）
    #[serde(default = "default_qa_timeout")]
    pub qa_timeout_secs: u64,

    /// 播客脚本上下文上限（字符）
    #[serde(default = "default_script_chars")]
    pub script_context_chars: usize,
}

fn default_analysis_url() -> String {
    "http://localhost:8200".to_string()
}

fn default_analysis_timeout() -> u64 {
    60
}

fn default_analysis_retries() -> u32 {
    2
}

fn default_analyze_chars() -> usize {
    5_000
}

fn default_max_entities() -> usize {
    10
}

fn default_qa_chars() -> usize {
    10_000
}

fn default_suggest_chars() -> usize {
    5_000
}

fn default_qa_timeout() -> u64 {
    30
}

fn default_script_chars() -> usize {
    12_000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            url: default_analysis_url(),
            timeout_secs: default_analysis_timeout(),
            max_retries: default_analysis_retries(),
            analyze_context_chars: default_analyze_chars(),
            max_entities: default_max_entities(),
            qa_context_chars: default_qa_chars(),
            suggest_context_chars: default_suggest_chars(),
            qa_timeout_secs: default_qa_timeout(),
            script_context_chars: default_script_chars(),
        }
    }
}

/// 语音合成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 合成服务基础 URL
    #[serde(default = "default_speech_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,

    /// 旁白文本的成本上界（字符）- 全书合成过于昂贵，超出部分截断
    #[serde(default = "default_speech_max_chars")]
    pub max_chars: usize,
}

fn default_speech_url() -> String {
    "http://localhost:8300".to_string()
}

fn default_speech_timeout() -> u64 {
    120
}

fn default_speech_max_chars() -> usize {
    2_000
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            url: default_speech_url(),
            timeout_secs: default_speech_timeout(),
            max_chars: default_speech_max_chars(),
        }
    }
}

/// 图像生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    /// 图像服务基础 URL
    #[serde(default = "default_images_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_images_timeout")]
    pub timeout_secs: u64,

    /// 缺省艺术风格
    #[serde(default = "default_style")]
    pub default_style: String,

    /// 缺省种子（固定以便复现）
    #[serde(default = "default_seed")]
    pub default_seed: u64,

    /// 场景图数量上限
    #[serde(default = "default_max_scenes")]
    pub max_scenes: usize,

    /// 封面/场景图宽
    #[serde(default = "default_cover_width")]
    pub cover_width: u32,

    /// 封面/场景图高
    #[serde(default = "default_cover_height")]
    pub cover_height: u32,

    /// 头像边长
    #[serde(default = "default_portrait_size")]
    pub portrait_size: u32,

    /// 头像缺省风格
    #[serde(default = "default_style")]
    pub portrait_style: String,

    /// 书加载后预取头像的角色数
    #[serde(default = "default_portrait_prefetch")]
    pub portrait_prefetch: usize,

    /// 图像生成的退避重试调度
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_images_url() -> String {
    "https://image.pollinations.ai".to_string()
}

fn default_images_timeout() -> u64 {
    90
}

fn default_style() -> String {
    "storybook".to_string()
}

fn default_seed() -> u64 {
    42
}

fn default_max_scenes() -> usize {
    5
}

fn default_cover_width() -> u32 {
    1280
}

fn default_cover_height() -> u32 {
    720
}

fn default_portrait_size() -> u32 {
    512
}

fn default_portrait_prefetch() -> usize {
    5
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            url: default_images_url(),
            timeout_secs: default_images_timeout(),
            default_style: default_style(),
            default_seed: default_seed(),
            max_scenes: default_max_scenes(),
            cover_width: default_cover_width(),
            cover_height: default_cover_height(),
            portrait_size: default_portrait_size(),
            portrait_style: default_style(),
            portrait_prefetch: default_portrait_prefetch(),
            retry: RetryConfig::default(),
        }
    }
}

/// 退避重试调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// 总尝试次数上限
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,

    /// 首次重试前的等待（毫秒）
    #[serde(default = "default_retry_base_ms")]
    pub base_delay_ms: u64,

    /// 间隔倍率
    #[serde(default = "default_retry_factor")]
    pub growth_factor: f64,

    /// 间隔上限（毫秒）
    #[serde(default = "default_retry_max_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_base_ms() -> u64 {
    2_000
}

fn default_retry_factor() -> f64 {
    2.0
}

fn default_retry_max_ms() -> u64 {
    32_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_base_ms(),
            growth_factor: default_retry_factor(),
            max_delay_ms: default_retry_max_ms(),
        }
    }
}

impl RetryConfig {
    /// 转换为领域层调度策略
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            growth_factor: self.growth_factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// 生成 worker 配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 最大并发生成数（尊重外部服务限流）
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 工作单队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    1_024
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 生成资产根目录
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// 头像缓存数据库路径
    #[serde(default = "default_portraits_db")]
    pub portraits_db: PathBuf,

    /// 上传文件最大大小（字节）
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("data/assets")
}

fn default_portraits_db() -> PathBuf {
    PathBuf::from("data/portraits.sled")
}

fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            portraits_db: default_portraits_db(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/bookvision.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
