//! `/analyze` handler
//!
//! Decode the body, ask the collaborator for a score, classify, encode.
//! Collaborator failures are logged and surface as a bare 500.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use std::error::Error;
use std::sync::Arc;

use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::sentiment::{classify, AnalysisRequest, AnalyzerError, Document, SentimentAnalyzer};

pub async fn handle_analyze<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return resp;
    }

    let body = match read_body(req.into_body(), max_body_size).await {
        Ok(body) => body,
        Err(status) => return http::build_empty_response(status),
    };

    let Ok(request) = AnalysisRequest::decode(&body) else {
        return http::build_empty_response(StatusCode::BAD_REQUEST);
    };

    let document = Document::plain_text(request.text, state.config.collaborator.language.as_str());
    match analyze_detached(Arc::clone(&state.analyzer), document).await {
        Ok(score) => encode_result(score),
        Err(e) => {
            logger::log_error(&format!("Failed to analyze sentiment: {e}"));
            http::build_empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Run the outbound call on its own task so a dropped inbound connection
/// does not cancel it mid-flight.
async fn analyze_detached(
    analyzer: Arc<dyn SentimentAnalyzer>,
    document: Document,
) -> Result<f32, AnalyzerError> {
    tokio::spawn(async move { analyzer.analyze_sentiment(&document).await })
        .await
        .unwrap_or_else(|e| Err(AnalyzerError::TaskAborted(e.to_string())))
}

fn encode_result(score: f32) -> Response<Full<Bytes>> {
    match serde_json::to_vec(&classify(score)) {
        Ok(json) => http::build_json_response(Bytes::from(json)),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            http::build_empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Reject a declared `Content-Length` above the limit before reading
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size = req
        .headers()
        .get(hyper::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;

    if size > max_body_size {
        logger::log_debug(&format!(
            "Request body too large: {size} bytes (max: {max_body_size})"
        ));
        Some(http::build_empty_response(StatusCode::PAYLOAD_TOO_LARGE))
    } else {
        None
    }
}

/// Collect the body, enforcing the limit on streamed bodies as well
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(StatusCode::PAYLOAD_TOO_LARGE)
        }
        Err(e) => {
            logger::log_debug(&format!("Failed to read request body: {e}"));
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
