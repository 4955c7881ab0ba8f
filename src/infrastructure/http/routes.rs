//! HTTP Routes
//!
//! API 路由定义（前缀可配置，默认 /api）:
//! - /upload                      POST    上传图书（同步提取 + 分析）
//! - /story                       GET     当前图书正文
//! - /qa                          POST    基于当前图书问答
//! - /suggested_questions         GET     建议问题
//! - /entity_image/{name}         GET     角色头像（缓存优先）
//! - /entity_image/{name}/regenerate POST 头像重新生成（版本 +1）
//! - /generate/audio              POST    有声书旁白
//! - /generate/visuals            POST    插图集（location 先于内容）
//! - /generate/podcast            POST    播客播放列表
//! - /generate/retry              POST    单工件手动重试
//! - /generate/status/{job_id}    GET     Job 状态
//! - /library                     GET     书架列表（?sort=）
//! - /library/load/{id}           POST    加载书架条目
//! - /library/{id}                DELETE  删除图书
//! - /assets/{*path}              GET     资产字节（就绪前 404）
//! - /ping                        GET     健康检查

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由（挂在配置的前缀下）
pub fn create_routes(api_prefix: &str) -> Router<Arc<AppState>> {
    Router::new().nest(api_prefix, api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/upload", post(handlers::upload_book))
        .route("/story", get(handlers::get_story))
        .route("/qa", post(handlers::qa))
        .route("/suggested_questions", get(handlers::suggested_questions))
        .route("/entity_image/:name", get(handlers::get_entity_image))
        .route(
            "/entity_image/:name/regenerate",
            post(handlers::regenerate_entity_image),
        )
        .nest("/generate", generate_routes())
        .route("/library", get(handlers::list_library))
        .route("/library/load/:id", post(handlers::load_book))
        .route("/library/:id", delete(handlers::delete_book))
        .route("/assets/*path", get(handlers::get_asset))
}

/// 生成路由
fn generate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/audio", post(handlers::generate_audio))
        .route("/visuals", post(handlers::generate_visuals))
        .route("/podcast", post(handlers::generate_podcast))
        .route("/retry", post(handlers::retry_artifact))
        .route("/status/:job_id", get(handlers::job_status))
}
