//! Interpretation of Document Provider replies
//!
//! The provider answers with whatever is at hand: clean JSON, JSON wrapped in
//! stray text, a bare `OK`, or an HTML error page. Every reply is classified
//! first and then mapped to a [`NormalizedResult`] or an explicit error. The
//! functions here hold no state, so the same reply always normalizes to the
//! same result.

use crate::domain::NormalizedResult;
use crate::providers::constants::{
    error_messages, json_fields, limits, markers, upstream_fields,
};
use crate::providers::{ProviderError, ProviderResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Widest `{...}` span, the last resort when no balanced object parses
static WIDEST_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static pattern should compile"));

/// Raw reply from an upstream call, fully read into memory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

/// Classification of a reply, decided before any mapping
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyKind {
    /// Non-2xx status with an HTML document body
    HtmlErrorPage,
    /// Non-2xx status with any other body
    StatusError,
    /// 2xx status with an HTML document body
    UnexpectedHtml,
    /// 2xx status with a JSON value in the body
    Json(Value),
    /// 2xx status with no extractable JSON
    PlainText,
}

impl ReplyKind {
    /// Error for the kinds that never map to a result
    fn failure(&self, reply: &UpstreamReply) -> Option<ProviderError> {
        match self {
            Self::HtmlErrorPage => Some(html_error(reply, error_messages::HTML_ERROR_PAGE)),
            Self::StatusError => Some(ProviderError::Status {
                status: reply.status,
                message: format!("upstream error: {} {}", reply.status, reply.status_text)
                    .trim_end()
                    .to_string(),
                details: reply.body.clone(),
            }),
            Self::UnexpectedHtml => Some(html_error(reply, error_messages::UNEXPECTED_HTML)),
            Self::Json(_) | Self::PlainText => None,
        }
    }
}

impl UpstreamReply {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classify a reply: status first, then the HTML marker, then JSON
pub fn classify(reply: &UpstreamReply) -> ReplyKind {
    let html = is_html_document(&reply.body);

    if !reply.is_success() {
        return if html {
            ReplyKind::HtmlErrorPage
        } else {
            ReplyKind::StatusError
        };
    }
    if html {
        return ReplyKind::UnexpectedHtml;
    }

    match extract_json(&reply.body) {
        Some(value) => ReplyKind::Json(value),
        None => ReplyKind::PlainText,
    }
}

/// Maps provider replies to the client contract
#[derive(Clone, Debug)]
pub struct ResponseNormalizer {
    relay_base_url: String,
}

impl ResponseNormalizer {
    /// `relay_base_url` is the public URL of the artifact download route
    pub fn new(relay_base_url: impl Into<String>) -> Self {
        Self {
            relay_base_url: relay_base_url.into(),
        }
    }

    /// Normalize a reply to a document generation request (JSON-bearing)
    pub fn normalize_document(&self, reply: &UpstreamReply) -> ProviderResult<NormalizedResult> {
        let kind = classify(reply);
        if let Some(error) = kind.failure(reply) {
            return Err(error);
        }

        match kind {
            ReplyKind::Json(value) => self.map_document(&value),
            _ => Err(ProviderError::Malformed {
                message: error_messages::NOT_JSON,
                details: None,
            }),
        }
    }

    /// Normalize a plain-text lookup confirmation (`OK` or an error text)
    pub fn normalize_confirmation(
        &self,
        reply: &UpstreamReply,
    ) -> ProviderResult<NormalizedResult> {
        if let Some(error) = classify(reply).failure(reply) {
            return Err(error);
        }

        let text = reply.body.trim();
        if text == markers::CONFIRMATION_OK {
            Ok(NormalizedResult::ok())
        } else {
            Ok(NormalizedResult::error(text))
        }
    }

    /// Download links pointing at this service's relay route
    pub fn artifact_links(&self, id: &str, artifact_name: &str) -> (String, String) {
        let separator = if self.relay_base_url.contains('?') {
            '&'
        } else {
            '?'
        };
        let link = |suffix: &str| {
            format!(
                "{}{}{}={}&{}={}",
                self.relay_base_url,
                separator,
                upstream_fields::ARTIFACT_ID,
                urlencoding::encode(id),
                upstream_fields::ARTIFACT_NAME,
                urlencoding::encode(&format!("{artifact_name}{suffix}"))
            )
        };

        (link(markers::PDF_SUFFIX), link(markers::XML_SUFFIX))
    }

    fn map_document(&self, value: &Value) -> ProviderResult<NormalizedResult> {
        let unrecognized = || ProviderError::Malformed {
            message: error_messages::UNRECOGNIZED_SHAPE,
            details: Some(value.clone()),
        };
        let object = value.as_object().ok_or_else(unrecognized)?;

        let pdf_link = link_field(object, json_fields::PDF_LINK);
        let xml_link = link_field(object, json_fields::XML_LINK);
        if pdf_link.is_some() || xml_link.is_some() {
            return Ok(NormalizedResult::with_links(pdf_link, xml_link));
        }

        let id = scalar_field(object, json_fields::ID);
        let artifact_name = trimmed_field(object, json_fields::ARTIFACT_NAME)
            .or_else(|| trimmed_field(object, json_fields::ARTIFACT_NAME_SHORT));

        match (id, artifact_name) {
            (Some(id), Some(artifact_name)) => {
                let (pdf_link, xml_link) = self.artifact_links(&id, &artifact_name);
                Ok(NormalizedResult::with_links(Some(pdf_link), Some(xml_link)))
            }
            _ => Err(unrecognized()),
        }
    }
}

/// Error for a non-2xx reply, or `None` when the status is a success
pub fn failure_error(reply: &UpstreamReply) -> Option<ProviderError> {
    if reply.is_success() {
        return None;
    }
    classify(reply).failure(reply)
}

/// Whether a body starts with an HTML document marker
pub fn is_html_document(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    markers::HTML_DOCUMENT
        .iter()
        .any(|marker| head.starts_with(marker))
}

/// Parse the body as JSON, falling back to the first embedded object
pub fn extract_json(body: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(body.trim()) {
        return Some(value);
    }

    if let Some(value) = first_embedded_value(body) {
        return Some(value);
    }

    WIDEST_OBJECT
        .find(body)
        .and_then(|span| serde_json::from_str(span.as_str()).ok())
}

/// Prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn html_error(reply: &UpstreamReply, message: &'static str) -> ProviderError {
    ProviderError::HtmlPage {
        status: reply.status,
        message,
        details: truncate_chars(&reply.body, limits::ERROR_DETAIL_CHARS).to_string(),
    }
}

/// First JSON value starting at the first `{`; trailing text is ignored
fn first_embedded_value(body: &str) -> Option<Value> {
    let start = body.find('{')?;
    serde_json::Deserializer::from_str(&body[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// String field copied verbatim
fn link_field(object: &Map<String, Value>, name: &str) -> Option<String> {
    object.get(name).and_then(Value::as_str).map(str::to_string)
}

fn trimmed_field(object: &Map<String, Value>, name: &str) -> Option<String> {
    object
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_field(object: &Map<String, Value>, name: &str) -> Option<String> {
    match object.get(name)? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(_) => trimmed_field(object, name),
        _ => None,
    }
}
