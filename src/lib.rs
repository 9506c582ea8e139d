//! Danfe Proxy - a forwarding backend for a Document Provider
//!
//! Browsers upload invoice XML files or submit access-key lookups; this
//! service re-encodes them into the provider's wire shape, normalizes the
//! provider's ad-hoc replies into one JSON contract and relays generated
//! artifacts as byte streams. It also forwards contact-form messages by
//! e-mail.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod providers;
pub mod proxy;

pub use application::Application;
pub use error::{Error, Result};
