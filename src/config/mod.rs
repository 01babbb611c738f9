// Configuration module entry point
// Loads layered configuration and holds the per-process application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    CollaboratorConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest precedence first: built-in defaults, the optional file,
    /// then `SENTIMENT__SECTION__KEY` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SENTIMENT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 30)?
            .set_default("http.server_name", "sentiment-gateway")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("collaborator.endpoint", "https://language.googleapis.com/v1")?
            .set_default("collaborator.language", "en")?
            .set_default("collaborator.timeout_secs", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
