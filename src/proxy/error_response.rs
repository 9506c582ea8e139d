//! Unified error response handling for the proxy service
//!
//! Every failure leaves the service as the same JSON shape, including
//! extractor rejections and failures of the binary relay route, so browser
//! clients only ever parse one error format.

use crate::proxy::types::{ProxyError, REQUEST_ID_HEADER};
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Unique error code for programmatic handling
    pub code: String,
    /// Request ID for correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Upstream detail: an HTML excerpt, the raw body or the parsed JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            request_id: None,
            details: None,
        }
    }

    /// Add request ID for correlation
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convert to HTTP response with proper headers
    ///
    /// Without a request ID the error is also stored in the response
    /// extensions, where `request_id_middleware` picks it up and re-renders it
    /// with the ID of the request.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let mut response = (status, Json(&self)).into_response();
        let header_value = self.request_id.as_deref().map(HeaderValue::from_str);

        match header_value {
            Some(Ok(header_value)) => {
                response
                    .headers_mut()
                    .insert(REQUEST_ID_HEADER, header_value);
            }
            Some(Err(_)) => {}
            None => {
                response.extensions_mut().insert(self);
            }
        }

        response
    }
}

/// Extension trait for consistent error formatting
pub trait ErrorResponseExt {
    /// Convert to standardized error response
    fn to_error_response(&self) -> ErrorResponse;

    /// Get the appropriate HTTP status code
    fn status_code(&self) -> StatusCode;
}

impl ErrorResponseExt for ProxyError {
    fn to_error_response(&self) -> ErrorResponse {
        use ProxyError::*;

        match self {
            InvalidInput(message) => ErrorResponse::new("INVALID_INPUT", message.clone()),
            UpstreamHtmlError {
                message, details, ..
            } => ErrorResponse::new("UPSTREAM_HTML_ERROR", message.clone())
                .with_details(serde_json::Value::String(details.clone())),
            UpstreamError {
                message, details, ..
            } => {
                let response = ErrorResponse::new("UPSTREAM_ERROR", message.clone());
                if details.is_empty() {
                    response
                } else {
                    response.with_details(serde_json::Value::String(details.clone()))
                }
            }
            UpstreamMalformed { message, details } => {
                let response = ErrorResponse::new("UPSTREAM_MALFORMED", message.clone());
                match details {
                    Some(value) => response.with_details(value.clone()),
                    None => response,
                }
            }
            UpstreamUnreachable(_) => ErrorResponse::new("UPSTREAM_UNREACHABLE", self.to_string()),
            Internal(message) => ErrorResponse::new("INTERNAL_ERROR", message.clone()),
        }
    }

    fn status_code(&self) -> StatusCode {
        use ProxyError::*;

        match self {
            InvalidInput(_) => StatusCode::BAD_REQUEST,
            UpstreamHtmlError { .. } => StatusCode::BAD_GATEWAY,
            UpstreamError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            UpstreamMalformed { .. } | UpstreamUnreachable(_) | Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Helper to extract request ID from headers
pub fn extract_request_id(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}
