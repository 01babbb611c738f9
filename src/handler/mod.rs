//! Request handler module
//!
//! Routing dispatch plus the three endpoint handlers: sentiment analysis and
//! the two static responders.

pub mod analyze;
pub mod docs;
pub mod health;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
