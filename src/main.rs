use std::sync::Arc;

use sentiment_gateway::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use sentiment_gateway::handler::docs::ApiDocs;
use sentiment_gateway::logger;
use sentiment_gateway::sentiment::GoogleLanguageClient;
use sentiment_gateway::server::{self, SignalHandler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create Tokio runtime, sizing worker threads from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    let analyzer = GoogleLanguageClient::new(&cfg.collaborator)?;
    if !analyzer.has_credentials() {
        logger::log_warning(
            "No provider credentials found; /analyze will answer 500 until \
             collaborator.api_key, GOOGLE_API_KEY or GOOGLE_OAUTH_ACCESS_TOKEN is set",
        );
    }
    let docs = ApiDocs::load()?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg, Arc::new(analyzer), docs));
    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    server::run(listener, state, signals).await;
    Ok(())
}
