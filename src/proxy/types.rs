//! Type definitions for the proxy module

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{FormRejection, QueryRejection};
use nutype::nutype;
use serde_json::Value;
use thiserror::Error;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Absolute URL of an upstream call
#[nutype(
    derive(Clone, Debug, Display, PartialEq, Eq, TryFrom, AsRef),
    validate(predicate = |s: &str| s.starts_with("http://") || s.starts_with("https://")),
)]
pub struct TargetUrl(String);

/// Errors that can occur while serving a client request
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Client input failed validation; the upstream was not contacted
    #[error("{0}")]
    InvalidInput(String),

    #[error("{message}")]
    UpstreamHtmlError {
        status: u16,
        message: String,
        details: String,
    },

    /// Non-2xx upstream reply; the status is relayed to the client
    #[error("{message}")]
    UpstreamError {
        status: u16,
        message: String,
        details: String,
    },

    #[error("{message}")]
    UpstreamMalformed {
        message: String,
        details: Option<Value>,
    },

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

impl From<MultipartRejection> for ProxyError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartError> for ProxyError {
    fn from(error: MultipartError) -> Self {
        Self::InvalidInput(error.body_text())
    }
}

impl From<FormRejection> for ProxyError {
    fn from(rejection: FormRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}
