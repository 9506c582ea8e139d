//! Property-based tests for reply normalization and input validation

use danfe_proxy::domain::{AccessKey, ResultStatus, ACCESS_KEY_LENGTH};
use danfe_proxy::providers::normalizer::truncate_chars;
use danfe_proxy::providers::{ProviderError, ResponseNormalizer, UpstreamReply};
use proptest::prelude::*;
use proptest::string::string_regex;

const RELAY: &str = "http://localhost:3001/download-artifact";

fn normalizer() -> ResponseNormalizer {
    ResponseNormalizer::new(RELAY)
}

pub mod generators {
    use super::*;

    /// Bodies starting with an HTML marker in any letter case
    pub fn html_body() -> impl Strategy<Value = String> {
        (
            "[ \t\r\n]{0,4}",
            prop_oneof![
                string_regex("<![dD][oO][cC][tT][yY][pP][eE] [hH][tT][mM][lL]>").unwrap(),
                string_regex("<[hH][tT][mM][lL]>").unwrap(),
            ],
            ".{0,200}",
        )
            .prop_map(|(lead, marker, rest)| format!("{lead}{marker}{rest}"))
    }

    pub fn any_status() -> impl Strategy<Value = u16> {
        100u16..600
    }

    pub fn artifact_id() -> impl Strategy<Value = String> {
        string_regex("[A-Za-z0-9]{1,12}").unwrap()
    }

    pub fn artifact_name() -> impl Strategy<Value = String> {
        string_regex("[A-Za-z0-9çãé_-][A-Za-z0-9 çãé&=?._-]{0,18}[A-Za-z0-9]").unwrap()
    }
}

fn describe(result: &Result<danfe_proxy::domain::NormalizedResult, ProviderError>) -> String {
    format!("{result:?}")
}

proptest! {
    #[test]
    fn normalization_is_idempotent(status in generators::any_status(), body in ".{0,300}") {
        let reply = UpstreamReply::new(status, "Status", body);
        let normalizer = normalizer();

        prop_assert_eq!(
            describe(&normalizer.normalize_document(&reply)),
            describe(&normalizer.normalize_document(&reply))
        );
        prop_assert_eq!(
            describe(&normalizer.normalize_confirmation(&reply)),
            describe(&normalizer.normalize_confirmation(&reply))
        );
    }

    #[test]
    fn html_bodies_are_always_html_errors(
        status in generators::any_status(),
        body in generators::html_body(),
    ) {
        let reply = UpstreamReply::new(status, "Status", body);

        let document = normalizer().normalize_document(&reply);
        let document_is_html = matches!(document, Err(ProviderError::HtmlPage { .. }));
        prop_assert!(document_is_html, "document result: {:?}", document);

        let confirmation = normalizer().normalize_confirmation(&reply);
        let confirmation_is_html = matches!(confirmation, Err(ProviderError::HtmlPage { .. }));
        prop_assert!(confirmation_is_html, "confirmation result: {:?}", confirmation);
    }

    #[test]
    fn html_details_never_exceed_limit(body in generators::html_body()) {
        let padded = format!("{body}{}", "x".repeat(1000));
        let reply = UpstreamReply::new(500, "Internal Server Error", padded);

        match normalizer().normalize_document(&reply) {
            Err(ProviderError::HtmlPage { details, .. }) => {
                let length = details.chars().count();
                prop_assert!(length <= 500, "detail length {}", length)
            }
            other => prop_assert!(false, "unexpected result: {:?}", other),
        }
    }

    #[test]
    fn access_keys_must_be_44_digits(digits in "[0-9]{0,60}") {
        let accepted = AccessKey::try_new(digits.clone()).is_ok();
        prop_assert_eq!(accepted, digits.len() == ACCESS_KEY_LENGTH);
    }

    #[test]
    fn access_keys_reject_non_digits(prefix in "[0-9]{43}", bad in "[A-Za-z./-]") {
        let candidate = format!("{prefix}{bad}");
        let rejected = AccessKey::try_new(candidate.clone()).is_err();
        prop_assert!(rejected, "accepted {}", candidate);
    }

    #[test]
    fn artifact_links_encode_name_and_id(
        id in generators::artifact_id(),
        name in generators::artifact_name(),
    ) {
        let body = serde_json::json!({ "id": id, "arq": name }).to_string();
        let result = normalizer()
            .normalize_document(&UpstreamReply::new(200, "OK", body))
            .unwrap();

        let encoded_name = urlencoding::encode(&name).into_owned();
        let pdf_link = result.pdf_link.unwrap();
        let xml_link = result.xml_link.unwrap();

        let id_param = format!("id={}", id);
        let pdf_suffix = format!("arq={}.pdf", encoded_name);
        let xml_suffix = format!("arq={}.xml", encoded_name);

        prop_assert!(pdf_link.starts_with(RELAY), "pdf link: {}", pdf_link);
        prop_assert!(pdf_link.contains(&id_param), "pdf link: {}", pdf_link);
        prop_assert!(pdf_link.ends_with(&pdf_suffix), "pdf link: {}", pdf_link);
        prop_assert!(xml_link.ends_with(&xml_suffix), "xml link: {}", xml_link);
    }

    #[test]
    fn padded_ok_confirms(lead in "[ \t\r\n]{0,5}", trail in "[ \t\r\n]{0,5}") {
        let reply = UpstreamReply::new(200, "OK", format!("{lead}OK{trail}"));
        let result = normalizer().normalize_confirmation(&reply).unwrap();
        prop_assert_eq!(result.status, ResultStatus::Ok);
    }

    #[test]
    fn truncation_yields_a_bounded_prefix(text in ".{0,80}", max in 0usize..100) {
        let truncated = truncate_chars(&text, max);
        let length = truncated.chars().count();
        prop_assert!(length <= max, "length {} exceeds {}", length, max);
        let is_prefix = text.starts_with(truncated);
        prop_assert!(is_prefix, "{:?} is not a prefix of {:?}", truncated, text);
    }
}
