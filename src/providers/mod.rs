//! Document Provider integration
//!
//! The provider layer turns validated client input into upstream calls
//! (`translator`), interprets the provider's replies (`normalizer`) and
//! handles the human-verification step that precedes lookups (`challenge`).
//! None of it performs I/O on its own; the proxy layer executes the
//! requests it describes.

pub mod challenge;
pub mod constants;
pub mod normalizer;
pub mod translator;

use crate::proxy::types::ProxyError;
use serde_json::Value;

pub use challenge::{ChallengeSolver, ChallengeVerifier};
pub use normalizer::{ReplyKind, ResponseNormalizer, UpstreamReply};
pub use translator::{FormPart, Operation, RequestTranslator, UpstreamBody, UpstreamRequest};

/// Provider-specific error type
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{message} (status {status})")]
    HtmlPage {
        status: u16,
        message: &'static str,
        details: String,
    },

    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        details: String,
    },

    #[error("{message}")]
    Malformed {
        message: &'static str,
        details: Option<Value>,
    },

    #[error("Challenge unsolved: {0}")]
    ChallengeUnsolved(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<ProviderError> for ProxyError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidInput(message) => ProxyError::InvalidInput(message),
            ProviderError::InvalidUrl(url) => ProxyError::Internal(format!("Invalid URL: {url}")),
            ProviderError::HtmlPage {
                status,
                message,
                details,
            } => ProxyError::UpstreamHtmlError {
                status,
                message: message.to_string(),
                details,
            },
            ProviderError::Status {
                status,
                message,
                details,
            } => ProxyError::UpstreamError {
                status,
                message,
                details,
            },
            ProviderError::Malformed { message, details } => ProxyError::UpstreamMalformed {
                message: message.to_string(),
                details,
            },
            ProviderError::ChallengeUnsolved(reason) => {
                ProxyError::InvalidInput(format!("challenge could not be solved: {reason}"))
            }
        }
    }
}
