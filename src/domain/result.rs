//! The client-facing result contract

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Ok,
    Error,
}

/// Normalized reply returned by the JSON routes
///
/// This is the only shape that crosses the boundary back to the browser,
/// whatever the provider actually answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NormalizedResult {
    pub fn ok() -> Self {
        Self {
            status: ResultStatus::Ok,
            pdf_link: None,
            xml_link: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            pdf_link: None,
            xml_link: None,
            message: Some(message.into()),
        }
    }

    pub fn with_links(pdf_link: Option<String>, xml_link: Option<String>) -> Self {
        Self {
            pdf_link,
            xml_link,
            ..Self::ok()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_result_omits_empty_fields() {
        let value = serde_json::to_value(NormalizedResult::ok()).unwrap();
        assert_eq!(value, json!({ "status": "Ok" }));
    }

    #[test]
    fn test_links_serialize_in_camel_case() {
        let result = NormalizedResult::with_links(
            Some("https://example.com/a.pdf".to_string()),
            Some("https://example.com/a.xml".to_string()),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["pdfLink"], "https://example.com/a.pdf");
        assert_eq!(value["xmlLink"], "https://example.com/a.xml");
        assert!(result.is_ok());
    }

    #[test]
    fn test_error_result_carries_message() {
        let value = serde_json::to_value(NormalizedResult::error("Chave inexistente")).unwrap();
        assert_eq!(
            value,
            json!({ "status": "Error", "message": "Chave inexistente" })
        );
    }
}
