//! Book HTTP Handlers - 上传 / 正文 / 书架

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    DeleteBook, GetStory, IngestBook, ListLibrary, LoadBook,
    ports::LibraryOrder,
};
use crate::domain::book::{Analysis, BookFormat, BookId, Entity};
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

/// 上传响应 - 分析随响应同步返回
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub filename: String,
    pub analysis: Analysis,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub body: String,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryQuery {
    /// date_desc | date_asc | title
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibraryEntry {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub filename: String,
    pub format: String,
    pub file_size: u64,
    pub thumbnail: Option<String>,
    pub upload_date: String,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub books: Vec<LibraryEntry>,
}

#[derive(Debug, Serialize)]
pub struct LoadBookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub analysis: Analysis,
}

// ============================================================================
// Handlers
// ============================================================================

/// 上传图书（multipart），同步完成提取 + 分析后返回
///
/// 头像预取在后台进行，不阻塞响应
pub async fn upload_book(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let filename = filename.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;
    let data = data.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;

    // 不支持的格式在入口即拒绝（4xx）
    let format = BookFormat::from_filename(&filename).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unsupported file format: {} (expected pdf, epub or txt)",
            filename
        ))
    })?;

    let result = state
        .ingest_handler
        .handle(IngestBook {
            filename: filename.clone(),
            format,
            data,
        })
        .await?;

    // 为排名靠前的角色并行预取头像（后台，失败只降级为无图）
    let portraits = state.portrait_handler.clone();
    let prefetch_count = state.defaults.portrait_prefetch;
    let portrait_style = state.defaults.portrait_style.clone();
    tokio::spawn(async move {
        portraits.prefetch_top(prefetch_count, &portrait_style).await;
    });

    Ok(Json(ApiResponse::success(UploadResponse {
        id: *result.book.id().as_uuid(),
        title: result.book.title().to_string(),
        author: result.book.author().to_string(),
        filename,
        analysis: result.analysis,
    })))
}

/// 当前图书正文
pub async fn get_story(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StoryResponse>>, ApiError> {
    let story = state.story_handler.handle(GetStory).await?;

    Ok(Json(ApiResponse::success(StoryResponse {
        body: story.body,
        entities: story.entities,
    })))
}

/// 书架列表（顺序由 ?sort= 指定）
pub async fn list_library(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<ApiResponse<LibraryResponse>>, ApiError> {
    let order = query
        .sort
        .as_deref()
        .and_then(LibraryOrder::from_str)
        .unwrap_or_default();

    let books = state.library_handler.handle(ListLibrary { order }).await?;

    let entries = books
        .into_iter()
        .map(|b| LibraryEntry {
            id: *b.id().as_uuid(),
            title: b.title().to_string(),
            author: b.author().to_string(),
            filename: b.filename().to_string(),
            format: b.format().as_str().to_string(),
            file_size: b.file_size(),
            thumbnail: b.thumbnail().map(|s| s.to_string()),
            upload_date: b.upload_date().to_rfc3339(),
        })
        .collect();

    Ok(Json(ApiResponse::success(LibraryResponse { books: entries })))
}

/// 加载书架条目为当前图书
pub async fn load_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LoadBookResponse>>, ApiError> {
    let snapshot = state
        .load_handler
        .handle(LoadBook {
            book_id: BookId::from_uuid(id),
        })
        .await?;

    // 加载同样触发头像预取（缓存命中时为零成本）
    let portraits = state.portrait_handler.clone();
    let prefetch_count = state.defaults.portrait_prefetch;
    let portrait_style = state.defaults.portrait_style.clone();
    tokio::spawn(async move {
        portraits.prefetch_top(prefetch_count, &portrait_style).await;
    });

    Ok(Json(ApiResponse::success(LoadBookResponse {
        id,
        title: snapshot.book.title().to_string(),
        author: snapshot.book.author().to_string(),
        analysis: snapshot.analysis.clone(),
    })))
}

/// 删除图书（级联清理全部派生状态）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_handler
        .handle(DeleteBook {
            book_id: BookId::from_uuid(id),
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}
