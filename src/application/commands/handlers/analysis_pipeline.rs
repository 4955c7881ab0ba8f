//! Analysis Pipeline - 语义分析编排
//!
//! 摄取时调用一次：截断上下文、委托分析服务、把返回的原始条目
//! 解析为领域 Analysis（去重 + 限量 + 章节启发式）。

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::AnalysisProviderPort;
use crate::domain::book::{Analysis, Entity};
use crate::domain::{excerpt, segment_chapters};

/// 分析策略参数
#[derive(Debug, Clone)]
pub struct AnalysisPipelineConfig {
    /// 送入分析服务的最大字符数
    pub max_context_chars: usize,
    /// 角色数量上限（约束下游图像生成成本）
    pub max_entities: usize,
}

impl Default for AnalysisPipelineConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 5_000,
            max_entities: 10,
        }
    }
}

/// Analysis Pipeline
pub struct AnalysisPipeline {
    provider: Arc<dyn AnalysisProviderPort>,
    config: AnalysisPipelineConfig,
}

impl AnalysisPipeline {
    pub fn new(provider: Arc<dyn AnalysisProviderPort>, config: AnalysisPipelineConfig) -> Self {
        Self { provider, config }
    }

    /// 对提取后的全文做语义分析
    ///
    /// - 文本为空 → AnalysisError
    /// - 服务返回零角色 → 成功，空角色序列（下游渲染空状态）
    pub async fn analyze(&self, text: &str) -> Result<Analysis, ApplicationError> {
        if text.trim().is_empty() {
            return Err(ApplicationError::analysis(
                "extracted text is empty or unreadable",
            ));
        }

        let context = excerpt(text, self.config.max_context_chars);
        let raw = self.provider.analyze(context).await?;

        let entities: Vec<Entity> = raw
            .entities
            .into_iter()
            .map(|e| Entity::new(e.name, e.role).with_appearance(e.appearance))
            .collect();

        let analysis = Analysis::new(
            raw.summary,
            entities,
            raw.scenes,
            raw.keywords,
            segment_chapters(text),
            self.config.max_entities,
        );

        tracing::info!(
            entities = analysis.entities.len(),
            scenes = analysis.scenes.len(),
            chapters = analysis.chapters.len(),
            "Semantic analysis completed"
        );

        Ok(analysis)
    }
}
