//! Sentiment domain
//!
//! Request/response types of `/analyze`, the score classification rule and
//! the collaborator seam (`SentimentAnalyzer`) with its Google implementation.

mod analyzer;
pub mod google;

pub use analyzer::{AnalyzerError, Document, DocumentType, SentimentAnalyzer};
pub use google::{Credentials, GoogleLanguageClient};

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Body of `POST /analyze`
///
/// The `text` key matches without regard to ASCII case and the last
/// occurrence wins. Missing or `null` `text` leaves the empty string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub text: String,
}

impl<'de> Deserialize<'de> for AnalysisRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RequestVisitor)
    }
}

struct RequestVisitor;

impl<'de> Visitor<'de> for RequestVisitor {
    type Value = AnalysisRequest;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut request = AnalysisRequest::default();
        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("text") {
                // null keeps whatever an earlier key set
                if let Some(text) = map.next_value::<Option<String>>()? {
                    request.text = text;
                }
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(request)
    }
}

impl AnalysisRequest {
    /// Decode the first JSON value of a request body.
    ///
    /// Bytes after the first complete value are ignored, and a top-level
    /// `null` is an empty request.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<Self>>();
        match values.next() {
            Some(value) => Ok(value?.unwrap_or_default()),
            None => Err(de::Error::custom("empty request body")),
        }
    }
}

/// Three-way polarity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Body returned by `POST /analyze`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    #[serde(rename = "sentiment_score", serialize_with = "serialize_score")]
    pub score: f32,
}

/// Whole-number scores go out as JSON integers (`0`, `1`), everything else in
/// shortest round-trip float form.
#[allow(
    clippy::trivially_copy_pass_by_ref,
    clippy::cast_possible_truncation,
    clippy::float_cmp
)]
fn serialize_score<S: Serializer>(score: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if score.is_finite() && score.fract() == 0.0 && score.abs() < 1e9 {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f32(*score)
    }
}

/// Map a signed provider score to a label and non-negative magnitude.
///
/// Anything that is neither above nor below zero (0, -0, NaN) is neutral
/// with magnitude 0.
pub fn classify(score: f32) -> AnalysisResult {
    if score > 0.0 {
        AnalysisResult {
            sentiment: Sentiment::Positive,
            score,
        }
    } else if score < 0.0 {
        AnalysisResult {
            sentiment: Sentiment::Negative,
            score: -score,
        }
    } else {
        AnalysisResult {
            sentiment: Sentiment::Neutral,
            score: 0.0,
        }
    }
}
