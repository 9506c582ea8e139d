//! Translation of client operations into Document Provider calls
//!
//! The translator is pure: it describes the upstream request (method, URL
//! and body parts) and leaves execution to the upstream client, so every
//! wire shape can be checked without a network.

use crate::config::{LookupStyle, ProviderSettings};
use crate::domain::{DownloadRequest, LookupRequest, UploadedFile};
use crate::providers::constants::{error_messages, limits, upstream_fields};
use crate::providers::{ProviderError, ProviderResult};
use crate::proxy::types::TargetUrl;
use bytes::Bytes;
use http::Method;
use rand::Rng;

/// Client-initiated operations the provider supports
#[derive(Clone, Debug)]
pub enum Operation {
    /// Generate a document from an uploaded XML file
    SubmitFile(UploadedFile),
    /// Generate a document from an access key
    LookupByKey(LookupRequest),
    /// Ask the provider whether an access key can be looked up (plain-text reply)
    ConfirmLookup(LookupRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitFile(_) => "submit_file",
            Self::LookupByKey(_) => "lookup_by_key",
            Self::ConfirmLookup(_) => "confirm_lookup",
        }
    }
}

/// One part of a multipart body sent upstream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: &'static str,
        value: String,
    },
    File {
        name: &'static str,
        file_name: String,
        mime_type: String,
        bytes: Bytes,
    },
}

impl FormPart {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamBody {
    Empty,
    Multipart(Vec<FormPart>),
}

/// Fully described upstream call
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: TargetUrl,
    pub body: UpstreamBody,
}

/// Builds provider requests from validated client input
#[derive(Clone, Debug)]
pub struct RequestTranslator {
    base_url: String,
    command_path: String,
    generate_command: String,
    lookup_command: String,
    verify_command: String,
    download_command: String,
    lookup_style: LookupStyle,
}

impl RequestTranslator {
    pub fn new(settings: &ProviderSettings) -> Self {
        let command_path = if settings.command_path.starts_with('/') {
            settings.command_path.clone()
        } else {
            format!("/{}", settings.command_path)
        };

        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            command_path,
            generate_command: settings.generate_command.clone(),
            lookup_command: settings.lookup_command.clone(),
            verify_command: settings.verify_command.clone(),
            download_command: settings.download_command.clone(),
            lookup_style: settings.lookup_style,
        }
    }

    /// Describe the upstream call for an operation
    pub fn translate(&self, operation: Operation) -> ProviderResult<UpstreamRequest> {
        match operation {
            Operation::SubmitFile(file) => self.submit_file(file),
            Operation::LookupByKey(lookup) => self.lookup(&self.lookup_command, &lookup),
            Operation::ConfirmLookup(lookup) => self.lookup(&self.verify_command, &lookup),
        }
    }

    /// Provider URL of a downloadable artifact
    pub fn download_url(&self, request: &DownloadRequest) -> ProviderResult<TargetUrl> {
        self.command_url(
            &self.download_command,
            &[
                (upstream_fields::ARTIFACT_ID, request.id.as_ref()),
                (upstream_fields::ARTIFACT_NAME, request.artifact_name.as_ref()),
            ],
        )
    }

    fn submit_file(&self, file: UploadedFile) -> ProviderResult<UpstreamRequest> {
        if file.is_empty() {
            return Err(ProviderError::InvalidInput(
                error_messages::EMPTY_FILE.to_string(),
            ));
        }

        let cache_buster = cache_buster().to_string();
        let url = self.command_url(
            &self.generate_command,
            &[
                (upstream_fields::FILE_COUNT, "1"),
                (upstream_fields::FILE_NAME, ""),
                (upstream_fields::CACHE_BUSTER, &cache_buster),
            ],
        )?;

        Ok(UpstreamRequest {
            method: Method::POST,
            url,
            body: UpstreamBody::Multipart(vec![FormPart::File {
                name: upstream_fields::FILE,
                file_name: file.name,
                mime_type: file.mime_type,
                bytes: file.bytes,
            }]),
        })
    }

    fn lookup(&self, command: &str, lookup: &LookupRequest) -> ProviderResult<UpstreamRequest> {
        let fields = [
            (upstream_fields::ACCESS_KEY, lookup.access_key.as_ref()),
            (
                upstream_fields::CHALLENGE_TOKEN,
                lookup.challenge_token.as_ref(),
            ),
            (
                upstream_fields::DOCUMENT_TYPE,
                lookup.document_type.wire_flag(),
            ),
        ];
        let cache_buster = cache_buster().to_string();

        match self.lookup_style {
            LookupStyle::PostMultipart => {
                let url =
                    self.command_url(command, &[(upstream_fields::CACHE_BUSTER, &cache_buster)])?;
                let parts = fields
                    .iter()
                    .map(|&(name, value)| FormPart::Text {
                        name,
                        value: value.to_string(),
                    })
                    .collect();

                Ok(UpstreamRequest {
                    method: Method::POST,
                    url,
                    body: UpstreamBody::Multipart(parts),
                })
            }
            LookupStyle::GetQuery => {
                let mut params = fields.to_vec();
                params.push((upstream_fields::CACHE_BUSTER, &cache_buster));

                Ok(UpstreamRequest {
                    method: Method::GET,
                    url: self.command_url(command, &params)?,
                    body: UpstreamBody::Empty,
                })
            }
        }
    }

    fn command_url(&self, command: &str, params: &[(&str, &str)]) -> ProviderResult<TargetUrl> {
        let mut url = format!(
            "{}{}?{}={}",
            self.base_url,
            self.command_path,
            upstream_fields::COMMAND,
            urlencoding::encode(command)
        );
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        TargetUrl::try_new(url.clone()).map_err(|_| ProviderError::InvalidUrl(url))
    }
}

/// Cache-busting value appended to provider URLs; not a security token
pub fn cache_buster() -> u16 {
    rand::thread_rng().gen_range(0..=limits::CACHE_BUSTER_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::{AccessKey, ArtifactId, ArtifactName, ChallengeToken, DocumentType};

    const ACCESS_KEY: &str = "35240612345678000190550010000012341000012345";

    fn translator(style: LookupStyle) -> RequestTranslator {
        let mut settings = Settings::from_defaults().unwrap().provider;
        settings.base_url = "https://provider.test/".to_string();
        settings.lookup_style = style;
        RequestTranslator::new(&settings)
    }

    fn lookup_request() -> LookupRequest {
        LookupRequest {
            access_key: AccessKey::try_new(ACCESS_KEY.to_string()).unwrap(),
            document_type: DocumentType::Cte,
            challenge_token: ChallengeToken::try_new("token-123".to_string()).unwrap(),
        }
    }

    fn query_params(url: &TargetUrl) -> Vec<(String, String)> {
        let query = url.as_ref().split_once('?').map(|(_, q)| q).unwrap_or("");
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| {
                (
                    name.to_string(),
                    urlencoding::decode(value).unwrap().into_owned(),
                )
            })
            .collect()
    }

    fn param(url: &TargetUrl, name: &str) -> Option<String> {
        query_params(url)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    #[test]
    fn test_submit_file_builds_multipart_post() {
        let file = UploadedFile::new("nota.xml", "text/xml", Bytes::from_static(b"<nfeProc/>"));
        let request = translator(LookupStyle::PostMultipart)
            .translate(Operation::SubmitFile(file))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert!(request
            .url
            .as_ref()
            .starts_with("https://provider.test/comandos.aspx?t=gerarpdf&arquivos=1&nomedoarquivo=&r="));

        match request.body {
            UpstreamBody::Multipart(parts) => {
                assert_eq!(parts.len(), 1);
                assert_eq!(
                    parts[0],
                    FormPart::File {
                        name: "arquivo",
                        file_name: "nota.xml".to_string(),
                        mime_type: "text/xml".to_string(),
                        bytes: Bytes::from_static(b"<nfeProc/>"),
                    }
                );
            }
            UpstreamBody::Empty => panic!("expected a multipart body"),
        }
    }

    #[test]
    fn test_submit_file_cache_buster_is_in_range() {
        let file = UploadedFile::new("nota.xml", "text/xml", Bytes::from_static(b"<nfe/>"));
        let request = translator(LookupStyle::PostMultipart)
            .translate(Operation::SubmitFile(file))
            .unwrap();

        let value: u16 = param(&request.url, "r").unwrap().parse().unwrap();
        assert!(value <= limits::CACHE_BUSTER_MAX);
    }

    #[test]
    fn test_submit_empty_file_is_rejected() {
        let file = UploadedFile::new("nota.xml", "text/xml", Bytes::new());
        let result = translator(LookupStyle::PostMultipart).translate(Operation::SubmitFile(file));
        assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
    }

    #[test]
    fn test_lookup_post_style_sends_fields_in_body() {
        let request = translator(LookupStyle::PostMultipart)
            .translate(Operation::LookupByKey(lookup_request()))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(param(&request.url, "t").as_deref(), Some("consultarchave"));
        assert!(param(&request.url, "chave").is_none());

        let UpstreamBody::Multipart(parts) = request.body else {
            panic!("expected a multipart body");
        };
        let names: Vec<_> = parts.iter().map(FormPart::name).collect();
        assert_eq!(names, vec!["chave", "captcha", "tipo"]);
        assert!(parts.contains(&FormPart::Text {
            name: "tipo",
            value: "cte".to_string(),
        }));
    }

    #[test]
    fn test_lookup_get_style_sends_fields_in_query() {
        let request = translator(LookupStyle::GetQuery)
            .translate(Operation::LookupByKey(lookup_request()))
            .unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.body, UpstreamBody::Empty);
        assert_eq!(param(&request.url, "chave").as_deref(), Some(ACCESS_KEY));
        assert_eq!(param(&request.url, "captcha").as_deref(), Some("token-123"));
        assert_eq!(param(&request.url, "tipo").as_deref(), Some("cte"));
        assert!(param(&request.url, "r").is_some());
    }

    #[test]
    fn test_confirm_lookup_targets_verify_command() {
        let request = translator(LookupStyle::PostMultipart)
            .translate(Operation::ConfirmLookup(lookup_request()))
            .unwrap();
        assert_eq!(param(&request.url, "t").as_deref(), Some("verificarchave"));
    }

    #[test]
    fn test_download_url_encodes_artifact_name() {
        let request = DownloadRequest {
            id: ArtifactId::try_new("123".to_string()).unwrap(),
            artifact_name: ArtifactName::try_new("nota fiscal.pdf".to_string()).unwrap(),
        };
        let url = translator(LookupStyle::PostMultipart)
            .download_url(&request)
            .unwrap();

        assert_eq!(
            url.as_ref(),
            "https://provider.test/comandos.aspx?t=gerarpdfdownload&id=123&arq=nota%20fiscal.pdf"
        );
    }

    #[test]
    fn test_cache_buster_stays_within_bounds() {
        for _ in 0..1000 {
            assert!(cache_buster() <= limits::CACHE_BUSTER_MAX);
        }
    }
}
