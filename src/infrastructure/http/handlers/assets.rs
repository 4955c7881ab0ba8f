//! Asset HTTP Handler - 生成资产的原始字节
//!
//! 轮询协议的外部真源：内容落盘前 404，落盘后 200。

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::application::ports::AssetError;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 扩展名到 Content-Type 的映射
fn content_type_for(rel_path: &str) -> &'static str {
    match rel_path.rsplit('.').next() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// 读取资产字节；不存在即 404（调用方按退避调度重试）
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(rel_path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.asset_store.read(&rel_path).await.map_err(|e| match e {
        AssetError::NotFound(p) => ApiError::NotFound(format!("Asset not found: {}", p)),
        AssetError::InvalidPath(p) => ApiError::BadRequest(format!("Invalid asset path: {}", p)),
        AssetError::IoError(msg) => ApiError::Internal(msg),
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&rel_path)),
            // 生成资产不可变（重新生成走新路径或版本号），可长缓存
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    )
        .into_response())
}
