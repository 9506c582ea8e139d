//! Domain types for the forwarding backend
//!
//! Everything here is request-scoped: values are built from an inbound
//! request, handed to the provider layer and dropped when the request ends.

pub mod documents;
pub mod result;
pub mod types;

pub use documents::*;
pub use result::*;
pub use types::*;
