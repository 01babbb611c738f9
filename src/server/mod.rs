// Server module entry
// Accept loop, per-connection serving and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_listener;
pub use signal::{start_signal_handler, SignalHandler};

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::logger;

/// Accept connections until shutdown is requested, then wait for the
/// connections already accepted to finish.
///
/// The wait is bounded by the longer of `performance.connection_timeout` and
/// `collaborator.timeout_secs`. Connections still open after that are
/// aborted.
pub async fn run(listener: TcpListener, state: Arc<AppState>, signals: Arc<SignalHandler>) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let mut connections = JoinSet::new();
    let shutdown = signals.subscribe();
    let mut stop = signals.subscribe();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &shutdown,
                            &mut connections,
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = joined {
                    logger::log_error(&format!("Connection task failed: {e}"));
                }
            }

            () = signal::shutdown_requested(&mut stop) => {
                logger::log_info("Stopped accepting connections");
                break;
            }
        }
    }

    drop(listener);
    drain(connections, drain_timeout(&state)).await;
}

fn drain_timeout(state: &AppState) -> Duration {
    let secs = state
        .config
        .performance
        .connection_timeout
        .max(state.config.collaborator.timeout_secs);
    Duration::from_secs(secs)
}

async fn drain(mut connections: JoinSet<()>, limit: Duration) {
    if connections.is_empty() {
        return;
    }
    logger::log_info(&format!(
        "Waiting up to {}s for {} open connection(s)",
        limit.as_secs(),
        connections.len()
    ));

    let finished = tokio::time::timeout(limit, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if finished.is_err() {
        logger::log_warning(&format!(
            "Aborting {} connection(s) still open after {}s",
            connections.len(),
            limit.as_secs()
        ));
        connections.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::docs::ApiDocs;
    use crate::sentiment::{
        AnalyzerError, Credentials, Document, GoogleLanguageClient, SentimentAnalyzer,
    };
    use async_trait::async_trait;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    struct FixedScore {
        score: f32,
        delay: Duration,
    }

    #[async_trait]
    impl SentimentAnalyzer for FixedScore {
        async fn analyze_sentiment(&self, _document: &Document) -> Result<f32, AnalyzerError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.score)
        }
    }

    fn test_config() -> Config {
        let mut config = Config::load_from("does-not-exist/config").unwrap();
        config.logging.access_log = false;
        config.performance.keep_alive = false;
        config
    }

    fn start(
        config: Config,
        analyzer: Arc<dyn SentimentAnalyzer>,
    ) -> (SocketAddr, Arc<SignalHandler>, tokio::task::JoinHandle<()>) {
        let state = Arc::new(AppState::new(config, analyzer, ApiDocs::load().unwrap()));
        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let signals = Arc::new(SignalHandler::new());
        let server = tokio::spawn(run(listener, state, Arc::clone(&signals)));
        (addr, signals, server)
    }

    async fn post_analyze(addr: SocketAddr, body: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /analyze HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        stream
    }

    async fn read_all(mut stream: TcpStream) -> String {
        let mut raw = String::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut raw))
            .await
            .expect("response should arrive")
            .unwrap();
        raw
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let analyzer = FixedScore { score: -0.25, delay: Duration::ZERO };
        let (addr, signals, server) = start(test_config(), Arc::new(analyzer));

        let raw = read_all(post_analyze(addr, r#"{"text":"not great"}"#).await).await;
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "unexpected response: {raw}");
        assert!(raw.to_ascii_lowercase().contains("server: sentiment-gateway"));
        assert!(raw.ends_with(r#"{"sentiment":"negative","sentiment_score":0.25}"#));

        signals.request_shutdown();
        tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .expect("accept loop should stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_finishes_request_in_flight() {
        let analyzer = FixedScore { score: 0.5, delay: Duration::from_millis(500) };
        let (addr, signals, server) = start(test_config(), Arc::new(analyzer));

        let stream = post_analyze(addr, r#"{"text":"slow"}"#).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        signals.request_shutdown();

        // run only returns once the connection has been served
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("drain should finish")
            .unwrap();

        let raw = read_all(stream).await;
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "unexpected response: {raw}");
        assert!(raw.ends_with(r#"{"sentiment":"positive","sentiment_score":0.5}"#));
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_hold_shutdown() {
        let mut config = test_config();
        config.performance.keep_alive = true;
        let analyzer = FixedScore { score: 0.0, delay: Duration::ZERO };
        let (addr, signals, server) = start(config, Arc::new(analyzer));

        let idle = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        signals.request_shutdown();

        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("idle connection should be closed on shutdown")
            .unwrap();
        drop(idle);
    }

    #[tokio::test]
    async fn test_collaborator_timeout_answers_500() {
        // accepts provider connections and never answers
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let provider = silent.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = silent.accept().await {
                held.push(stream);
            }
        });

        let mut config = test_config();
        config.collaborator.endpoint = format!("http://{provider}/v1");
        config.collaborator.timeout_secs = 1;
        config.performance.connection_timeout = 1;
        let client = GoogleLanguageClient::with_credentials(
            &config.collaborator,
            Some(Credentials::ApiKey("k".to_string())),
        )
        .unwrap();
        let (addr, signals, _server) = start(config, Arc::new(client));

        let raw = read_all(post_analyze(addr, r#"{"text":"hello"}"#).await).await;
        assert!(
            raw.starts_with("HTTP/1.1 500 Internal Server Error"),
            "unexpected response: {raw}"
        );
        signals.request_shutdown();
    }
}
