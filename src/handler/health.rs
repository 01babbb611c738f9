// `/healthcheck` responder: liveness only, no downstream checks

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::http;

pub fn serve_healthcheck() -> Response<Full<Bytes>> {
    http::build_empty_response(StatusCode::OK)
}
