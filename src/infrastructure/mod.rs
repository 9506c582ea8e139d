//! Infrastructure layer for the forwarding backend
//!
//! External concerns that are not the Document Provider itself: outgoing
//! e-mail and the tracing subscriber.

pub mod email;
pub mod telemetry;

pub use email::{ContactMailer, MailError};
pub use telemetry::init_tracing;
