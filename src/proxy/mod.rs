//! HTTP surface of the forwarding backend
//!
//! Inbound requests are validated here, handed to the provider layer for
//! translation, executed by the upstream client and answered with the
//! normalized result, a relayed byte stream or a JSON error.

pub mod error_response;
pub mod form;
pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod middleware_stack;
pub mod relay;
pub mod service;
pub mod types;
pub mod upstream;


pub use service::ProxyService;
pub use types::{ProxyError, ProxyResult};
pub use upstream::UpstreamClient;
