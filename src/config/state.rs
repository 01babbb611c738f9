// Application state module
// Everything a request handler needs, built once at startup

use std::sync::Arc;

use super::types::Config;
use crate::handler::docs::ApiDocs;
use crate::sentiment::SentimentAnalyzer;

/// Application state shared read-only by every connection
pub struct AppState {
    pub config: Config,
    /// Sentiment provider client, injected so tests can substitute a stub
    pub analyzer: Arc<dyn SentimentAnalyzer>,
    pub docs: ApiDocs,
}

impl AppState {
    pub fn new(config: Config, analyzer: Arc<dyn SentimentAnalyzer>, docs: ApiDocs) -> Self {
        Self {
            config,
            analyzer,
            docs,
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
