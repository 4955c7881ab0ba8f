//! Bookvision - 图书多媒体生成编排服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 图书与语义分析上下文
//! - Generation Context: 生成任务状态机与退避调度
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repository, JobTracker, PortraitCache,
//!   TextExtractor, AnalysisProvider, SpeechEngine, ImageEngine, AssetStore）
//! - Commands: CQRS 命令处理器（摄取、删除、三条生成工作流、重试）
//! - Queries: CQRS 查询处理器（正文、书架、问答、Job 状态）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API（轮询式完成发现，无推送通道）
//! - Memory: JobTracker、CurrentBook 槽位内存实现
//! - Worker: GenerationWorker 后台工件处理
//! - Persistence: SQLite 书架目录 + Sled 头像缓存
//! - Adapters: 四个外部服务客户端 + 文件资产库

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
