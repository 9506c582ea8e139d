//! Middleware implementations for the proxy service

use crate::proxy::error_response::{extract_request_id, ErrorResponse};
use crate::proxy::types::{ProxyError, REQUEST_ID_HEADER};
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Request ID middleware - ensures every request has a unique ID for tracing
///
/// A valid UUID supplied by the caller is kept; anything else is replaced by
/// a fresh v7 UUID. JSON error bodies produced downstream get the ID as
/// `requestId`.
pub async fn request_id_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ProxyError> {
    let request_id = match request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(existing) => existing,
        None => Uuid::now_v7(),
    };
    let header_value = HeaderValue::from_str(&request_id.to_string())
        .map_err(|e| ProxyError::Internal(format!("invalid request id header: {e}")))?;

    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value.clone());

    let mut response = next.run(request).await;
    if let Some(error) = response.extensions_mut().remove::<ErrorResponse>() {
        response = error
            .with_request_id(request_id.to_string())
            .into_response_with_status(response.status());
    }
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value);

    Ok(response)
}

/// Logging middleware - logs request/response details with timing
pub async fn logging_middleware(request: Request, next: Next) -> Result<Response, ProxyError> {
    let start = Instant::now();

    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = extract_request_id(request.headers()).unwrap_or_else(|| "unknown".to_string());

    info!(
        request_id = request_id,
        method = %method,
        path = %uri.path(),
        "Incoming request"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();

    info!(
        request_id = request_id,
        method = %method,
        path = %uri.path(),
        status = response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    Ok(response)
}

/// Logs failed responses with their request ID
///
/// Client errors are logged as warnings, server and upstream errors as errors.
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let request_id = extract_request_id(request.headers()).unwrap_or_else(|| "unknown".to_string());
    let path = request.uri().path().to_string();

    let response = next.run(request).await.into_response();
    let status = response.status();

    if status.is_server_error() {
        error!(
            request_id = request_id,
            path = path,
            status = status.as_u16(),
            "Request failed"
        );
    } else if status.is_client_error() {
        warn!(
            request_id = request_id,
            path = path,
            status = status.as_u16(),
            "Request rejected"
        );
    }

    response
}
