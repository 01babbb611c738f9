//! HTTP protocol layer module
//!
//! Response builders shared by every handler, decoupled from business logic.

pub mod response;

pub use response::{
    build_404_response, build_405_response, build_empty_response, build_json_response,
    with_server_header,
};
