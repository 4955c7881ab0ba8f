//! Plain Text Extractor - 本地 TXT 兜底
//!
//! 未配置外部提取服务时的最小可用路径：只接受 TXT，直接按 UTF-8
//! 解码；PDF/EPUB 一律报不支持。

use async_trait::async_trait;

use crate::application::ports::{
    ExtractedText, ExtractorError, ExtractRequest, TextExtractorPort,
};
use crate::domain::book::BookFormat;

/// 本地 TXT 提取器
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractorPort for PlainTextExtractor {
    async fn extract(&self, request: ExtractRequest) -> Result<ExtractedText, ExtractorError> {
        if request.format != BookFormat::Txt {
            return Err(ExtractorError::UnsupportedFormat(format!(
                "{} requires the external extractor service",
                request.format
            )));
        }

        let body = String::from_utf8(request.data)
            .map_err(|_| ExtractorError::Unreadable("file is not valid UTF-8 text".to_string()))?;

        // 标题取文件名主干，作者留空由上层兜底
        let title = std::path::Path::new(&request.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        Ok(ExtractedText {
            title,
            author: String::new(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_txt_extraction() {
        let result = PlainTextExtractor
            .extract(ExtractRequest {
                filename: "moby_dick.txt".to_string(),
                format: BookFormat::Txt,
                data: b"Call me Ishmael.".to_vec(),
            })
            .await
            .unwrap();

        assert_eq!(result.title, "moby_dick");
        assert_eq!(result.body, "Call me Ishmael.");
    }

    #[tokio::test]
    async fn test_pdf_requires_external_service() {
        let result = PlainTextExtractor
            .extract(ExtractRequest {
                filename: "book.pdf".to_string(),
                format: BookFormat::Pdf,
                data: vec![0x25, 0x50],
            })
            .await;

        assert!(matches!(result, Err(ExtractorError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_unreadable() {
        let result = PlainTextExtractor
            .extract(ExtractRequest {
                filename: "bad.txt".to_string(),
                format: BookFormat::Txt,
                data: vec![0xFF, 0xFE, 0x00],
            })
            .await;

        assert!(matches!(result, Err(ExtractorError::Unreadable(_))));
    }
}
