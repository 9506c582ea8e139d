//! Application wiring and lifecycle
//!
//! Settings are loaded, the forwarding service is assembled and the HTTP
//! server runs until a shutdown signal arrives.

pub mod app;

pub use app::Application;
