//! Q&A Queries

/// 基于当前图书回答问题
#[derive(Debug, Clone)]
pub struct AskQuestion {
    pub question: String,
}

/// 获取当前图书的建议问题
#[derive(Debug, Clone)]
pub struct SuggestQuestions;
