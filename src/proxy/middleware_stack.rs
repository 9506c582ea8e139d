//! Middleware stack builder for clean composition
//!
//! This module provides a builder pattern for composing the Tower middleware stack,
//! making it easier to maintain and test the middleware pipeline.

use crate::config::ApplicationSettings;
use crate::proxy::headers::{CONTENT_DISPOSITION, X_REQUEST_ID};
use crate::proxy::middleware::*;
use crate::{Error, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware::from_fn,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Origin value that allows every browser origin
pub const ANY_ORIGIN: &str = "*";

/// Builder for composing the proxy middleware stack
#[derive(Clone, Debug)]
pub struct ProxyMiddlewareStack {
    allowed_origin: AllowOrigin,
    max_body_bytes: usize,
}

impl ProxyMiddlewareStack {
    pub fn new(allowed_origin: &str, max_body_bytes: usize) -> Result<Self> {
        let allowed_origin = match allowed_origin.trim() {
            ANY_ORIGIN => AllowOrigin::any(),
            origin => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|e| {
                Error::invalid_setting("application.allowed_origin", e.to_string())
            })?),
        };

        Ok(Self {
            allowed_origin,
            max_body_bytes,
        })
    }

    pub fn from_settings(settings: &ApplicationSettings) -> Result<Self> {
        Self::new(&settings.allowed_origin, settings.max_body_bytes)
    }

    /// CORS policy: the configured origin, GET and POST, any request header
    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(self.allowed_origin.clone())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .expose_headers([CONTENT_DISPOSITION, HeaderName::from_static(X_REQUEST_ID)])
    }

    /// Apply the complete middleware stack to a router
    ///
    /// The middleware are applied in the following order (outer to inner):
    /// 1. CORS (answers preflight requests before anything else runs)
    /// 2. HTTP tracing spans
    /// 3. Request ID generation/propagation
    /// 4. Logging (with request ID)
    /// 5. Failure logging
    ///
    /// The body limit applies to every extractor inside the stack.
    pub fn apply_to_router<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let cors = self.cors_layer();

        router
            .layer(DefaultBodyLimit::max(self.max_body_bytes))
            .layer(from_fn(error_logging_middleware))
            .layer(from_fn(logging_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }
}
