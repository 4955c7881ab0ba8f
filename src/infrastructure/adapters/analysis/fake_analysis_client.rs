//! Fake Analysis Client - 用于测试/离线开发
//!
//! 不调用任何外部服务，返回确定性的最小分析结果

use async_trait::async_trait;

use crate::application::ports::{
    AnalysisProviderError, AnalysisProviderPort, RawAnalysis, RawEntity, ScriptLine,
};
use crate::domain::excerpt;

/// Fake Analysis Client
pub struct FakeAnalysisClient;

#[async_trait]
impl AnalysisProviderPort for FakeAnalysisClient {
    async fn analyze(&self, text: &str) -> Result<RawAnalysis, AnalysisProviderError> {
        Ok(RawAnalysis {
            summary: format!("{}...", excerpt(text, 200)),
            entities: vec![RawEntity {
                name: "Narrator".to_string(),
                role: "narrator".to_string(),
                appearance: String::new(),
            }],
            scenes: vec!["A key moment from the story.".to_string()],
            keywords: vec![],
        })
    }

    async fn answer(&self, _context: &str, question: &str) -> Result<String, AnalysisProviderError> {
        Ok(format!(
            "The analysis service is not configured; cannot answer: {}",
            question
        ))
    }

    async fn suggest_questions(
        &self,
        _context: &str,
    ) -> Result<Vec<String>, AnalysisProviderError> {
        Ok(vec![
            "What is this story about?".to_string(),
            "Who is the main character?".to_string(),
        ])
    }

    async fn podcast_script(
        &self,
        _context: &str,
    ) -> Result<Vec<ScriptLine>, AnalysisProviderError> {
        Ok(vec![
            ScriptLine {
                speaker: "Jax".to_string(),
                text: "Welcome back to the show!".to_string(),
            },
            ScriptLine {
                speaker: "Emma".to_string(),
                text: "Today we have a technical hiccup, but the book is still great.".to_string(),
            },
        ])
    }
}
