//! HTTP response building module
//!
//! Builders for the gateway's status-code responses, decoupled from handler logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};

/// Build a response with no body
pub fn build_empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 JSON response from pre-encoded bytes
pub fn build_json_response(body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            build_empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response with an empty body
pub fn build_405_response(allowed: &Method) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Allow", allowed.as_str())
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            build_empty_response(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Stamp the `Server` header onto a finished response
pub fn with_server_header(
    mut response: Response<Full<Bytes>>,
    server_name: &str,
) -> Response<Full<Bytes>> {
    if let Ok(value) = hyper::header::HeaderValue::from_str(server_name) {
        response.headers_mut().insert(hyper::header::SERVER, value);
    }
    response
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Body;

    #[test]
    fn test_empty_response() {
        let resp = build_empty_response(StatusCode::BAD_REQUEST);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.body().size_hint().exact(), Some(0));
    }

    #[test]
    fn test_405_names_allowed_method() {
        let resp = build_405_response(&Method::POST);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "POST");
        assert_eq!(resp.body().size_hint().exact(), Some(0));
    }

    #[test]
    fn test_server_header() {
        let resp = with_server_header(build_404_response(), "sentiment-gateway");
        assert_eq!(resp.headers()["server"], "sentiment-gateway");
        assert_eq!(resp.headers()["content-type"], "text/plain");
    }
}
