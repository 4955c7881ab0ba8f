//! Bookvision - 图书多媒体生成编排服务
//!
//! 装配顺序: 配置 → 日志 → 数据目录 → SQLite → Sled → 适配器 →
//! 任务队列/Worker → HTTP 服务器（优雅关闭）

use std::sync::Arc;

use bookvision::config::{load_config, print_config};
use bookvision::infrastructure::adapters::{
    FileAssetStore, HttpAnalysisClient, HttpAnalysisClientConfig, HttpExtractorClient,
    HttpExtractorClientConfig, HttpImageClient, HttpImageClientConfig, HttpSpeechClient,
    HttpSpeechClientConfig, PlainTextExtractor,
};
use bookvision::application::ports::TextExtractorPort;
use bookvision::infrastructure::http::{AppState, HttpServer, ServerConfig};
use bookvision::infrastructure::memory::{InMemoryCurrentBook, InMemoryJobTracker};
use bookvision::infrastructure::persistence::sled::{SledPortraitCache, SledPortraitCacheConfig};
use bookvision::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
};
use bookvision::infrastructure::worker::{GenerationWorker, GenerationWorkerConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},bookvision={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Bookvision - 图书多媒体生成编排服务");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.assets_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let book_repo = Arc::new(SqliteBookRepository::new(pool.clone()));

    // Sled 头像缓存
    let portrait_cache = Arc::new(SledPortraitCache::new(&SledPortraitCacheConfig {
        db_path: config.storage.portraits_db.to_string_lossy().to_string(),
    })?);

    // 文件资产库（URL 前缀与路由保持一致）
    let asset_store = Arc::new(
        FileAssetStore::new(&config.storage.assets_dir, config.server.assets_prefix()).await?,
    );

    // 外部服务客户端
    let extractor: Arc<dyn TextExtractorPort> = if config.extractor.url.is_empty() {
        // 未配置提取服务：仅支持 TXT 的本地路径
        Arc::new(PlainTextExtractor)
    } else {
        Arc::new(HttpExtractorClient::new(HttpExtractorClientConfig {
            base_url: config.extractor.url.clone(),
            timeout_secs: config.extractor.timeout_secs,
        })?)
    };

    let analysis_provider = Arc::new(HttpAnalysisClient::new(HttpAnalysisClientConfig {
        base_url: config.analysis.url.clone(),
        timeout_secs: config.analysis.timeout_secs,
        max_retries: config.analysis.max_retries,
    })?);

    let speech_engine = Arc::new(HttpSpeechClient::new(HttpSpeechClientConfig {
        base_url: config.speech.url.clone(),
        timeout_secs: config.speech.timeout_secs,
    })?);

    let image_engine = Arc::new(HttpImageClient::new(HttpImageClientConfig {
        base_url: config.images.url.clone(),
        timeout_secs: config.images.timeout_secs,
    })?);

    // 工作单队列 + 任务跟踪器
    let (order_tx, order_rx) = mpsc::channel(config.generation.queue_capacity);
    let job_tracker = Arc::new(InMemoryJobTracker::new(order_tx));

    // 当前图书槽位
    let current = Arc::new(InMemoryCurrentBook::new());

    // 生成 Worker
    let worker = GenerationWorker::new(
        GenerationWorkerConfig {
            max_concurrent: config.generation.max_concurrent,
            image_retry: config.images.retry.policy(),
        },
        order_rx,
        job_tracker.clone(),
        speech_engine.clone(),
        image_engine.clone(),
        asset_store.clone(),
    );
    tokio::spawn(worker.run());

    // HTTP 服务器
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        api_prefix: config.server.api_prefix.clone(),
        max_body_bytes: config.storage.max_upload_size as usize,
        static_dir: config
            .server
            .static_files
            .enabled
            .then(|| config.server.static_files.dir.clone()),
    };

    let state = AppState::new(
        &config,
        current,
        job_tracker,
        book_repo,
        portrait_cache,
        asset_store,
        extractor,
        analysis_provider,
        image_engine,
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
