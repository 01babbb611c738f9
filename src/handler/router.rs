//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: exact path lookup, method
//! validation, then dispatch to the endpoint handler.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;

use crate::config::AppState;
use crate::handler::{analyze, docs, health};
use crate::http;

/// Endpoints the gateway serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Analyze,
    Healthcheck,
    Docs,
}

impl Endpoint {
    /// The single method each endpoint accepts
    pub fn method(self) -> Method {
        match self {
            Self::Analyze => Method::POST,
            Self::Healthcheck | Self::Docs => Method::GET,
        }
    }
}

/// Route table, matched on exact path
pub const ROUTES: &[(&str, Endpoint)] = &[
    ("/analyze", Endpoint::Analyze),
    ("/healthcheck", Endpoint::Healthcheck),
    ("/docs", Endpoint::Docs),
];

pub fn lookup(path: &str) -> Option<Endpoint> {
    ROUTES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, endpoint)| *endpoint)
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let response = route_request(req, &state).await;
    Ok(http::with_server_header(
        response,
        &state.config.http.server_name,
    ))
}

async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let Some(endpoint) = lookup(req.uri().path()) else {
        return http::build_404_response();
    };

    let allowed = endpoint.method();
    if *req.method() != allowed {
        return http::build_405_response(&allowed);
    }

    match endpoint {
        Endpoint::Analyze => analyze::handle_analyze(req, state).await,
        Endpoint::Healthcheck => health::serve_healthcheck(),
        Endpoint::Docs => docs::serve_docs(&state.docs),
    }
}
