//! Q&A Query Handlers - 问答上下文装配
//!
//! 问答的上下文 = 摘要 + 全文的限量节选；外部服务有硬超时，
//! 超时以 TimeoutError 上报而非无限挂起。

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::ApplicationError;
use crate::application::ports::{AnalysisProviderPort, CurrentBookPort};
use crate::application::queries::{AskQuestion, SuggestQuestions};
use crate::domain::excerpt;

/// 问答策略参数
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// 问答上下文的全文节选上限（字符）
    pub context_chars: usize,
    /// 建议问题上下文上限（字符）
    pub suggest_context_chars: usize,
    /// 单次问答的硬超时
    pub timeout: Duration,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            context_chars: 10_000,
            suggest_context_chars: 5_000,
            timeout: Duration::from_secs(30),
        }
    }
}

/// AskQuestion Handler
pub struct AskQuestionHandler {
    current: Arc<dyn CurrentBookPort>,
    provider: Arc<dyn AnalysisProviderPort>,
    config: QaConfig,
}

impl AskQuestionHandler {
    pub fn new(
        current: Arc<dyn CurrentBookPort>,
        provider: Arc<dyn AnalysisProviderPort>,
        config: QaConfig,
    ) -> Self {
        Self {
            current,
            provider,
            config,
        }
    }

    pub async fn handle(&self, query: AskQuestion) -> Result<String, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;

        if query.question.trim().is_empty() {
            return Err(ApplicationError::validation("question is required"));
        }

        let context = format!(
            "{}\n\n{}",
            current.analysis.summary,
            excerpt(&current.full_text, self.config.context_chars)
        );

        let answer = tokio::time::timeout(
            self.config.timeout,
            self.provider.answer(&context, &query.question),
        )
        .await
        .map_err(|_| ApplicationError::Timeout("question answering".to_string()))??;

        Ok(answer)
    }
}

/// SuggestQuestions Handler - 每次加载派生一次，会话期内缓存
pub struct SuggestQuestionsHandler {
    current: Arc<dyn CurrentBookPort>,
    provider: Arc<dyn AnalysisProviderPort>,
    config: QaConfig,
}

impl SuggestQuestionsHandler {
    pub fn new(
        current: Arc<dyn CurrentBookPort>,
        provider: Arc<dyn AnalysisProviderPort>,
        config: QaConfig,
    ) -> Self {
        Self {
            current,
            provider,
            config,
        }
    }

    pub async fn handle(&self, _query: SuggestQuestions) -> Result<Vec<String>, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;

        let questions = current
            .suggested_questions
            .get_or_try_init(|| async {
                let context = excerpt(&current.full_text, self.config.suggest_context_chars);
                self.provider
                    .suggest_questions(context)
                    .await
                    .map_err(ApplicationError::from)
            })
            .await?;

        Ok(questions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AnalysisProviderError, CurrentBook, RawAnalysis, ScriptLine,
    };
    use crate::domain::book::{Analysis, Book, BookFormat, BookId, Title};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::RwLock;

    struct StubCurrent(RwLock<Option<Arc<CurrentBook>>>);

    impl CurrentBookPort for StubCurrent {
        fn set(&self, book: Arc<CurrentBook>) {
            *self.0.write().unwrap() = Some(book);
        }

        fn get(&self) -> Option<Arc<CurrentBook>> {
            self.0.read().unwrap().clone()
        }

        fn clear_if(&self, book_id: BookId) {
            let mut slot = self.0.write().unwrap();
            if slot.as_ref().map(|c| c.book.id()) == Some(book_id) {
                *slot = None;
            }
        }
    }

    /// 可配置延迟的问答服务，统计 suggest 调用次数
    struct SlowProvider {
        delay: Duration,
        suggest_calls: AtomicU64,
    }

    #[async_trait]
    impl AnalysisProviderPort for SlowProvider {
        async fn analyze(&self, _text: &str) -> Result<RawAnalysis, AnalysisProviderError> {
            unimplemented!()
        }

        async fn answer(&self, _c: &str, _q: &str) -> Result<String, AnalysisProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok("The whale wins.".to_string())
        }

        async fn suggest_questions(&self, _c: &str) -> Result<Vec<String>, AnalysisProviderError> {
            self.suggest_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["Who is Ahab?".to_string()])
        }

        async fn podcast_script(&self, _c: &str) -> Result<Vec<ScriptLine>, AnalysisProviderError> {
            unimplemented!()
        }
    }

    fn current_with_book() -> Arc<StubCurrent> {
        let book = Book::new(
            Title::new("Moby Dick").unwrap(),
            "Melville",
            "moby.txt",
            BookFormat::Txt,
            std::path::PathBuf::from("x/book.txt"),
            10,
        );
        let current = Arc::new(StubCurrent(RwLock::new(None)));
        current.set(Arc::new(CurrentBook::new(
            book,
            Analysis::new("A whale hunt.".to_string(), vec![], vec![], vec![], vec![], 10),
            "Call me Ishmael.".to_string(),
        )));
        current
    }

    #[tokio::test]
    async fn test_answer_requires_current_book() {
        let handler = AskQuestionHandler::new(
            Arc::new(StubCurrent(RwLock::new(None))),
            Arc::new(SlowProvider {
                delay: Duration::ZERO,
                suggest_calls: AtomicU64::new(0),
            }),
            QaConfig::default(),
        );

        let result = handler
            .handle(AskQuestion {
                question: "Who wins?".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NoContext)));
    }

    #[tokio::test]
    async fn test_answer_times_out() {
        let handler = AskQuestionHandler::new(
            current_with_book(),
            Arc::new(SlowProvider {
                delay: Duration::from_millis(200),
                suggest_calls: AtomicU64::new(0),
            }),
            QaConfig {
                timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        let result = handler
            .handle(AskQuestion {
                question: "Who wins?".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_answer_within_timeout() {
        let handler = AskQuestionHandler::new(
            current_with_book(),
            Arc::new(SlowProvider {
                delay: Duration::ZERO,
                suggest_calls: AtomicU64::new(0),
            }),
            QaConfig::default(),
        );

        let answer = handler
            .handle(AskQuestion {
                question: "Who wins?".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(answer, "The whale wins.");
    }

    #[tokio::test]
    async fn test_suggestions_derived_once_per_load() {
        let provider = Arc::new(SlowProvider {
            delay: Duration::ZERO,
            suggest_calls: AtomicU64::new(0),
        });
        let handler = SuggestQuestionsHandler::new(
            current_with_book(),
            provider.clone(),
            QaConfig::default(),
        );

        let first = handler.handle(SuggestQuestions).await.unwrap();
        let second = handler.handle(SuggestQuestions).await.unwrap();

        assert_eq!(first, second);
        // 会话期内只派生一次
        assert_eq!(provider.suggest_calls.load(Ordering::SeqCst), 1);
    }
}
