//! Google Cloud Natural Language client.
//!
//! Calls `POST {endpoint}/documents:analyzeSentiment` and extracts the
//! document-level score.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::analyzer::{AnalyzerError, Document, SentimentAnalyzer};
use crate::config::CollaboratorConfig;

/// How requests authenticate against the provider
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as the `key` query parameter
    ApiKey(String),
    /// Sent as `Authorization: Bearer`
    AccessToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(..)"),
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

impl Credentials {
    /// Resolve credentials from the process environment.
    pub fn discover(configured_key: Option<&str>) -> Option<Self> {
        Self::resolve(configured_key, |name| std::env::var(name).ok())
    }

    /// Precedence: configured key, `GOOGLE_API_KEY`, `GOOGLE_OAUTH_ACCESS_TOKEN`.
    /// Blank values are skipped.
    pub fn resolve(
        configured_key: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let non_blank = |v: String| (!v.trim().is_empty()).then_some(v);

        configured_key
            .map(ToString::to_string)
            .and_then(non_blank)
            .map(Self::ApiKey)
            .or_else(|| env("GOOGLE_API_KEY").and_then(non_blank).map(Self::ApiKey))
            .or_else(|| {
                env("GOOGLE_OAUTH_ACCESS_TOKEN")
                    .and_then(non_blank)
                    .map(Self::AccessToken)
            })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentRequest<'a> {
    document: &'a Document,
    encoding_type: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentResponse {
    document_sentiment: Option<DocumentSentiment>,
}

/// Proto3 JSON drops zero-valued fields, so an absent score is 0.
#[derive(Deserialize)]
struct DocumentSentiment {
    #[serde(default)]
    score: f32,
}

/// Sentiment analyzer backed by the Natural Language REST API.
///
/// Built once at startup; the inner `reqwest::Client` pools connections
/// across requests.
#[derive(Clone)]
pub struct GoogleLanguageClient {
    endpoint: String,
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl GoogleLanguageClient {
    /// Create a client, discovering credentials from config and environment.
    pub fn new(config: &CollaboratorConfig) -> Result<Self, AnalyzerError> {
        Self::with_credentials(config, Credentials::discover(config.api_key.as_deref()))
    }

    pub fn with_credentials(
        config: &CollaboratorConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, AnalyzerError> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build().map_err(AnalyzerError::Client)?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    pub const fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl SentimentAnalyzer for GoogleLanguageClient {
    async fn analyze_sentiment(&self, document: &Document) -> Result<f32, AnalyzerError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AnalyzerError::MissingCredentials)?;

        let request = self
            .client
            .post(format!("{}/documents:analyzeSentiment", self.endpoint))
            .json(&AnalyzeSentimentRequest {
                document,
                encoding_type: "UTF8",
            });
        let request = match credentials {
            Credentials::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Credentials::AccessToken(token) => request.bearer_auth(token),
        };

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeSentimentResponse =
            response.json().await.map_err(AnalyzerError::Decode)?;

        parsed
            .document_sentiment
            .map(|s| s.score)
            .ok_or(AnalyzerError::MissingSentiment)
    }
}
