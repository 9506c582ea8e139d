//! Streaming relay of generated artifacts
//!
//! Artifact bytes go from the provider to the client chunk by chunk and are
//! never buffered. Dropping the response body, including on client
//! disconnect, drops the upstream stream and closes its connection.

use crate::domain::DownloadRequest;
use crate::providers::normalizer::failure_error;
use crate::providers::{RequestTranslator, UpstreamReply};
use crate::proxy::headers::{
    attachment_disposition, content_types, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE,
};
use crate::proxy::types::{ProxyError, ProxyResult};
use crate::proxy::upstream::UpstreamClient;
use axum::body::Body;
use axum::http::HeaderValue;
use axum::response::Response;
use tracing::info;

/// Fetch an artifact from the provider and stream it back unmodified
pub async fn relay_artifact(
    upstream: &UpstreamClient,
    translator: &RequestTranslator,
    request: &DownloadRequest,
) -> ProxyResult<Response> {
    let url = translator.download_url(request)?;
    let upstream_response = upstream.open_stream(&url).await?;
    let status = upstream_response.status();

    if !status.is_success() {
        let body = upstream_response
            .text()
            .await
            .map_err(|e| ProxyError::UpstreamUnreachable(e.to_string()))?;
        let reply = UpstreamReply::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            body,
        );
        return Err(failure_error(&reply).map_or_else(
            || ProxyError::Internal(format!("unexpected upstream status {status}")),
            ProxyError::from,
        ));
    }

    let upstream_headers = upstream_response.headers();
    let content_type = upstream_headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(content_types::APPLICATION_ZIP));
    let content_disposition = match upstream_headers.get(CONTENT_DISPOSITION) {
        Some(value) => value.clone(),
        None => HeaderValue::from_str(&attachment_disposition(
            &request.artifact_name.disposition_filename(),
        ))
        .map_err(|e| ProxyError::Internal(format!("invalid content disposition: {e}")))?,
    };
    let content_length = upstream_headers.get(CONTENT_LENGTH).cloned();

    info!(
        artifact = %request.artifact_name,
        content_type = ?content_type,
        "Relaying artifact"
    );

    let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CONTENT_DISPOSITION, content_disposition);
    if let Some(length) = content_length {
        headers.insert(CONTENT_LENGTH, length);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::{ArtifactId, ArtifactName};
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn translator(base_url: String) -> RequestTranslator {
        let mut settings = Settings::from_defaults().unwrap().provider;
        settings.base_url = base_url;
        RequestTranslator::new(&settings)
    }

    fn download(name: &str) -> DownloadRequest {
        DownloadRequest {
            id: ArtifactId::try_new("123".to_string()).unwrap(),
            artifact_name: ArtifactName::try_new(name.to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_upstream_disposition_is_preserved() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/comandos.aspx")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("t".into(), "gerarpdfdownload".into()),
                Matcher::UrlEncoded("id".into(), "123".into()),
                Matcher::UrlEncoded("arq".into(), "nota.pdf".into()),
            ]))
            .with_header("content-type", "application/pdf")
            .with_header("content-disposition", "inline; filename=\"x.pdf\"")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let response = relay_artifact(&client, &translator(server.url()), &download("nota.pdf"))
            .await
            .unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "inline; filename=\"x.pdf\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_disposition_fallback_sanitizes_name() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/comandos.aspx")
            .match_query(Matcher::Any)
            .with_body("zip")
            .create_async()
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let response = relay_artifact(
            &client,
            &translator(server.url()),
            &download("no\"ta.zip"),
        )
        .await
        .unwrap();

        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"nota.zip\""
        );
        assert_eq!(response.headers()[CONTENT_TYPE], "application/zip");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_classified() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/comandos.aspx")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("<!DOCTYPE html><html><body>erro</body></html>")
            .create_async()
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let error = relay_artifact(&client, &translator(server.url()), &download("nota.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ProxyError::UpstreamHtmlError { status: 500, .. }
        ));
    }
}
