// Collaborator seam: the sentiment-analysis operation the gateway consumes

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Kind of content submitted for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    PlainText,
}

/// Unit of text submitted to the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: DocumentType,
    pub content: String,
    pub language: String,
}

impl Document {
    pub fn plain_text(content: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            kind: DocumentType::PlainText,
            content: content.into(),
            language: language.into(),
        }
    }
}

/// Why a sentiment lookup failed. Logged server-side, never sent to callers.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("no credentials found (set collaborator.api_key, GOOGLE_API_KEY or GOOGLE_OAUTH_ACCESS_TOKEN)")]
    MissingCredentials,

    #[error("failed to create client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("provider response carried no document sentiment")]
    MissingSentiment,

    #[error("analysis task aborted: {0}")]
    TaskAborted(String),
}

/// External sentiment-analysis operation.
///
/// Returns the provider's signed document score, conventionally in
/// `[-1.0, 1.0]`; callers must not assume it is clamped.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze_sentiment(&self, document: &Document) -> Result<f32, AnalyzerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wire_shape() {
        let doc = Document::plain_text("I love this", "en");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "PLAIN_TEXT",
                "content": "I love this",
                "language": "en"
            })
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = AnalyzerError::Status {
            status: 403,
            body: "API key not valid".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned 403: API key not valid");
    }
}
