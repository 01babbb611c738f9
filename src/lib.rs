//! Sentiment gateway
//!
//! A small HTTP front for a sentiment-analysis provider: `POST /analyze`
//! forwards text to the provider and answers with a positive, negative or
//! neutral label plus score magnitude. `GET /healthcheck` and `GET /docs`
//! are static responders.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod sentiment;
pub mod server;
