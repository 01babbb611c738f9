//! `/docs` responder
//!
//! Serves the Swagger 2.0 description compiled into the binary from
//! `assets/swagger.json`.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::http;

const SWAGGER_DOCUMENT: &str = include_str!("../../assets/swagger.json");

/// Pre-validated API description, served byte-for-byte on every call
#[derive(Debug, Clone)]
pub struct ApiDocs {
    body: Bytes,
}

impl ApiDocs {
    /// Validate the embedded document. Fails only if the asset is not JSON.
    pub fn load() -> Result<Self, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>(SWAGGER_DOCUMENT)?;
        Ok(Self {
            body: Bytes::from_static(SWAGGER_DOCUMENT.as_bytes()),
        })
    }

    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}

pub fn serve_docs(docs: &ApiDocs) -> Response<Full<Bytes>> {
    http::build_json_response(docs.body())
}
