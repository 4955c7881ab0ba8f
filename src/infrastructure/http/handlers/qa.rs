//! Q&A HTTP Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{AskQuestion, SuggestQuestions};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct QaResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestedQuestionsResponse {
    pub questions: Vec<String>,
}

/// 基于当前图书回答问题（硬超时见配置）
pub async fn qa(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QaRequest>,
) -> Result<Json<ApiResponse<QaResponse>>, ApiError> {
    let answer = state
        .ask_handler
        .handle(AskQuestion {
            question: req.question,
        })
        .await?;

    Ok(Json(ApiResponse::success(QaResponse { answer })))
}

/// 当前图书的建议问题（每次加载派生一次）
pub async fn suggested_questions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SuggestedQuestionsResponse>>, ApiError> {
    let questions = state.suggest_handler.handle(SuggestQuestions).await?;

    Ok(Json(ApiResponse::success(SuggestedQuestionsResponse {
        questions,
    })))
}
