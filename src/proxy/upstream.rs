//! Execution of upstream calls
//!
//! The client runs the requests described by the provider translator and
//! the challenge verifier. A non-2xx reply is a normal outcome handed to the
//! normalizer; only transport failures and timeouts become errors here.

use crate::providers::constants::limits;
use crate::providers::normalizer::truncate_chars;
use crate::providers::{FormPart, UpstreamBody, UpstreamReply, UpstreamRequest};
use crate::proxy::types::{ProxyError, ProxyResult, TargetUrl};
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shared HTTP client for every upstream service
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Run a described request and read the whole reply body
    pub async fn execute(&self, request: UpstreamRequest) -> ProxyResult<UpstreamReply> {
        let target = log_target(&request.url);
        let method = request.method.clone();

        let mut builder = self.client.request(request.method, request.url.as_ref());
        if let UpstreamBody::Multipart(parts) = request.body {
            builder = builder.multipart(build_form(parts)?);
        }

        self.read_reply(builder, &method.to_string(), target).await
    }

    /// POST a form-encoded body and read the whole reply
    pub async fn post_form(
        &self,
        url: &TargetUrl,
        fields: &[(&str, &str)],
    ) -> ProxyResult<UpstreamReply> {
        let builder = self.client.post(url.as_ref()).form(fields);
        self.read_reply(builder, "POST", log_target(url)).await
    }

    /// GET a URL and return once the reply headers arrive
    ///
    /// The timeout bounds the wait for headers only; the body is left for the
    /// caller to stream.
    pub async fn open_stream(&self, url: &TargetUrl) -> ProxyResult<reqwest::Response> {
        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.client.get(url.as_ref()).send())
            .await
            .map_err(|_| self.timed_out(log_target(url)))?
            .map_err(|e| transport_error(log_target(url), e))?;

        info!(
            method = "GET",
            upstream = log_target(url),
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Upstream stream opened"
        );

        Ok(response)
    }

    async fn read_reply(
        &self,
        builder: reqwest::RequestBuilder,
        method: &str,
        target: &str,
    ) -> ProxyResult<UpstreamReply> {
        let start = Instant::now();

        let (status, body) = tokio::time::timeout(self.timeout, async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await
        .map_err(|_| self.timed_out(target))?
        .map_err(|e| transport_error(target, e))?;

        info!(
            method = method,
            upstream = target,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Upstream call completed"
        );
        debug!(
            upstream = target,
            preview = truncate_chars(&body, limits::LOG_PREVIEW_CHARS),
            "Upstream body"
        );

        Ok(UpstreamReply::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            body,
        ))
    }

    fn timed_out(&self, target: &str) -> ProxyError {
        warn!(upstream = target, timeout = ?self.timeout, "Upstream call timed out");
        ProxyError::UpstreamUnreachable(format!("no reply within {:?}", self.timeout))
    }
}

fn transport_error(target: &str, error: reqwest::Error) -> ProxyError {
    warn!(upstream = target, error = %error, "Upstream transport failure");
    ProxyError::UpstreamUnreachable(error.to_string())
}

/// URL without its query string; lookup queries carry challenge tokens
fn log_target(url: &TargetUrl) -> &str {
    let url = url.as_ref();
    url.split_once('?').map_or(url, |(path, _)| path)
}

fn build_form(parts: Vec<FormPart>) -> ProxyResult<Form> {
    parts
        .into_iter()
        .try_fold(Form::new(), |form, part| match part {
            FormPart::Text { name, value } => Ok(form.text(name, value)),
            FormPart::File {
                name,
                file_name,
                mime_type,
                bytes,
            } => {
                let part = Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|e| {
                        ProxyError::InvalidInput(format!(
                            "invalid file content type '{mime_type}': {e}"
                        ))
                    })?;
                Ok(form.part(name, part))
            }
        })
}
