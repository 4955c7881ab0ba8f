//! Entity Portrait HTTP Handlers
//!
//! 头像获取降级友好：生成失败返回 image_url = null，前端渲染占位

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{GetEntityPortrait, RegeneratePortrait};
use crate::domain::book::DEFAULT_ENTITY_ROLE;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PortraitQuery {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortraitResponse {
    pub image_url: Option<String>,
    /// 版本号随显式重新生成递增，客户端据此打穿自身缓存
    pub version: Option<u64>,
}

/// 获取角色头像（缓存优先，未命中即生成）
pub async fn get_entity_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<PortraitQuery>,
) -> Result<Json<ApiResponse<PortraitResponse>>, ApiError> {
    let result = state
        .portrait_handler
        .get_or_create(GetEntityPortrait {
            entity_name: name,
            role: query.role.unwrap_or_else(|| DEFAULT_ENTITY_ROLE.to_string()),
            style: query
                .style
                .unwrap_or_else(|| state.defaults.portrait_style.clone()),
        })
        .await?;

    Ok(Json(ApiResponse::success(PortraitResponse {
        image_url: result.as_ref().map(|r| r.image_url.clone()),
        version: result.map(|r| r.version),
    })))
}

/// 显式重新生成头像（缓存打穿，版本 +1）
pub async fn regenerate_entity_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<PortraitQuery>,
) -> Result<Json<ApiResponse<PortraitResponse>>, ApiError> {
    let result = state
        .portrait_handler
        .regenerate(RegeneratePortrait {
            entity_name: name,
            role: query.role.unwrap_or_else(|| DEFAULT_ENTITY_ROLE.to_string()),
            style: query
                .style
                .unwrap_or_else(|| state.defaults.portrait_style.clone()),
        })
        .await?;

    Ok(Json(ApiResponse::success(PortraitResponse {
        image_url: result.as_ref().map(|r| r.image_url.clone()),
        version: result.map(|r| r.version),
    })))
}
