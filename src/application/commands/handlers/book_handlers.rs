//! Book Command Handlers

use std::sync::Arc;

use crate::application::commands::{DeleteBook, IngestBook, LoadBook};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AssetStorePort, BookRepositoryPort, CurrentBook, CurrentBookPort, ExtractRequest,
    JobTrackerPort, PortraitCachePort, TextExtractorPort,
};
use crate::domain::book::{Book, BookId, Title};

use super::AnalysisPipeline;

/// 摄取结果 - 新图书及其分析的快照
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub book: Book,
    pub analysis: crate::domain::book::Analysis,
}

/// 书内全文的存放路径（资产库相对路径，随书级联删除）
fn book_text_rel_path(book_id: BookId) -> String {
    format!("{}/book.txt", book_id)
}

fn original_rel_path(book_id: BookId, filename: &str) -> String {
    format!("{}/original/{}", book_id, filename)
}

// ============================================================================
// IngestBook
// ============================================================================

/// IngestBook Handler - 上传 → 提取 → 分析 → 入库 → 设为当前
pub struct IngestBookHandler {
    extractor: Arc<dyn TextExtractorPort>,
    pipeline: Arc<AnalysisPipeline>,
    book_repo: Arc<dyn BookRepositoryPort>,
    asset_store: Arc<dyn AssetStorePort>,
    current: Arc<dyn CurrentBookPort>,
}

impl IngestBookHandler {
    pub fn new(
        extractor: Arc<dyn TextExtractorPort>,
        pipeline: Arc<AnalysisPipeline>,
        book_repo: Arc<dyn BookRepositoryPort>,
        asset_store: Arc<dyn AssetStorePort>,
        current: Arc<dyn CurrentBookPort>,
    ) -> Self {
        Self {
            extractor,
            pipeline,
            book_repo,
            asset_store,
            current,
        }
    }

    pub async fn handle(&self, command: IngestBook) -> Result<IngestResult, ApplicationError> {
        let file_size = command.data.len() as u64;

        // 委托外部服务提取正文（OCR 兜底在服务内部）
        let extracted = self
            .extractor
            .extract(ExtractRequest {
                filename: command.filename.clone(),
                format: command.format,
                data: command.data.clone(),
            })
            .await?;

        if extracted.body.trim().is_empty() {
            return Err(ApplicationError::analysis(
                "extracted text is empty or unreadable",
            ));
        }

        // 语义分析（零角色也算成功）
        let analysis = self.pipeline.analyze(&extracted.body).await?;

        // 标题兜底：提取失败时用文件名主干
        let title_str = if extracted.title.trim().is_empty() {
            std::path::Path::new(&command.filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        } else {
            extracted.title.clone()
        };
        let title = Title::new(title_str).map_err(ApplicationError::validation)?;

        let book_id = BookId::new();
        let text_rel = book_text_rel_path(book_id);

        // 先落盘全文与原始文件，再写目录；重启后无需再调外部服务
        self.asset_store
            .write(&text_rel, extracted.body.as_bytes())
            .await?;
        self.asset_store
            .write(&original_rel_path(book_id, &command.filename), &command.data)
            .await?;

        let book = Book::from_parts(
            book_id,
            title,
            extracted.author.clone(),
            command.filename.clone(),
            command.format,
            std::path::PathBuf::from(&text_rel),
            file_size,
            None,
            chrono::Utc::now(),
        );

        self.book_repo.save(&book).await?;
        self.book_repo.save_analysis(book_id, &analysis).await?;

        // 原子切换当前上下文
        self.current.set(Arc::new(CurrentBook::new(
            book.clone(),
            analysis.clone(),
            extracted.body,
        )));

        tracing::info!(
            book_id = %book.id(),
            title = %book.title(),
            entities = analysis.entities.len(),
            "Book ingested"
        );

        Ok(IngestResult { book, analysis })
    }
}

// ============================================================================
// LoadBook
// ============================================================================

/// LoadBook Handler - 从书架加载为当前图书
pub struct LoadBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    asset_store: Arc<dyn AssetStorePort>,
    current: Arc<dyn CurrentBookPort>,
}

impl LoadBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        asset_store: Arc<dyn AssetStorePort>,
        current: Arc<dyn CurrentBookPort>,
    ) -> Self {
        Self {
            book_repo,
            asset_store,
            current,
        }
    }

    pub async fn handle(&self, command: LoadBook) -> Result<Arc<CurrentBook>, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let analysis = self
            .book_repo
            .find_analysis(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Analysis", command.book_id))?;

        let text_bytes = self
            .asset_store
            .read(&book.text_path().to_string_lossy())
            .await?;
        let full_text = String::from_utf8_lossy(&text_bytes).into_owned();

        let snapshot = Arc::new(CurrentBook::new(book, analysis, full_text));
        self.current.set(snapshot.clone());

        tracing::info!(book_id = %command.book_id, "Book loaded as current");

        Ok(snapshot)
    }
}

// ============================================================================
// DeleteBook
// ============================================================================

/// DeleteBook Handler - 级联清理目录、分析、资产、头像缓存与任务
pub struct DeleteBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    asset_store: Arc<dyn AssetStorePort>,
    portrait_cache: Arc<dyn PortraitCachePort>,
    job_tracker: Arc<dyn JobTrackerPort>,
    current: Arc<dyn CurrentBookPort>,
}

impl DeleteBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        asset_store: Arc<dyn AssetStorePort>,
        portrait_cache: Arc<dyn PortraitCachePort>,
        job_tracker: Arc<dyn JobTrackerPort>,
        current: Arc<dyn CurrentBookPort>,
    ) -> Self {
        Self {
            book_repo,
            asset_store,
            portrait_cache,
            job_tracker,
            current,
        }
    }

    pub async fn handle(&self, command: DeleteBook) -> Result<(), ApplicationError> {
        let book_id = command.book_id;

        let book = self
            .book_repo
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", book_id))?;

        // 目录行在单事务中消失：list/get 从此不可见
        self.book_repo.delete(book_id).await?;

        // 派生状态的清理是尽力而为；目录删除已提交，不再回滚
        self.job_tracker.remove_book_scope(book_id);
        if let Err(e) = self.portrait_cache.remove_book_scope(book_id).await {
            tracing::warn!(book_id = %book_id, error = %e, "Failed to purge portrait cache");
        }
        if let Err(e) = self.asset_store.remove_book_scope(book_id).await {
            tracing::warn!(book_id = %book_id, error = %e, "Failed to remove asset directory");
        }

        self.current.clear_if(book_id);

        tracing::info!(book_id = %book_id, title = %book.title(), "Book deleted");

        Ok(())
    }
}
