// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::handler;
use crate::logger::{self, AccessLogEntry};
use crate::server::signal;

/// Accept a connection, enforcing `max_connections`, and hand it to a task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `shutdown` - Flipped to `true` when the server starts draining
/// * `tasks` - Connection tasks the accept loop waits on at shutdown
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: &watch::Receiver<bool>,
    tasks: &mut JoinSet<()>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the cap
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_debug(&format!("Accepted connection from {peer_addr}"));

    tasks.spawn(handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        shutdown.clone(),
    ));
}

/// Serve one connection until the peer closes it.
///
/// `performance.connection_timeout` bounds how long the connection may sit
/// waiting for request headers, so an idle keep-alive connection is closed
/// but a request already being handled is never cut. On shutdown the
/// response in progress is finished and keep-alive is turned off.
async fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let header_timeout = state.config.performance.connection_timeout;

    let mut builder = http1::Builder::new();
    builder.keep_alive(state.config.performance.keep_alive);
    if header_timeout > 0 {
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(header_timeout));
    }

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
            let state = Arc::clone(&service_state);
            async move {
                let entry = state
                    .access_log_enabled()
                    .then(|| AccessLogEntry::from_request(&req, peer_addr));
                let started = Instant::now();

                let response = handler::handle_request(req, Arc::clone(&state)).await;

                if let (Some(mut entry), Ok(resp)) = (entry, &response) {
                    entry.status = resp.status().as_u16();
                    entry.body_bytes = resp.body().size_hint().exact().unwrap_or(0);
                    entry.request_time_us =
                        u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                    logger::log_access(&entry, &state.config.logging.access_log_format);
                }
                response
            }
        }),
    );

    let mut conn = std::pin::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = signal::shutdown_requested(&mut shutdown) => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    match result {
        Ok(()) => {}
        Err(err) if err.is_timeout() => logger::log_debug(&format!(
            "Connection from {peer_addr} closed after {header_timeout} seconds without a request"
        )),
        Err(err) => logger::log_connection_error(&err),
    }

    conn_counter.fetch_sub(1, Ordering::SeqCst);
}
