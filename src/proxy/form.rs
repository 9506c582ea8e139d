//! Inbound form collection
//!
//! Browser forms arrive as `multipart/form-data` or, when no file is
//! attached, as `application/x-www-form-urlencoded`, and under several
//! historical field names. The whole form is read once into memory, bounded
//! by the body limit, and fields are then looked up by alias.

use crate::domain::UploadedFile;
use crate::proxy::headers::{content_types, CONTENT_TYPE};
use crate::proxy::types::{ProxyError, ProxyResult};
use axum::extract::{FromRequest, Multipart, Request};
use axum::Form;

#[derive(Debug, Default)]
pub struct InboundForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl<S> FromRequest<S> for InboundForm
where
    S: Send + Sync,
{
    type Rejection = ProxyError;

    /// Pick the parser from the request's content type
    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_urlencoded(&request) {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(request, state).await?;
            Ok(Self::from_fields(fields))
        } else {
            let multipart = Multipart::from_request(request, state).await?;
            Self::from_multipart(multipart).await
        }
    }
}

impl InboundForm {
    pub fn from_fields(fields: Vec<(String, String)>) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }

    pub async fn from_multipart(mut multipart: Multipart) -> ProxyResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let mime_type = field
                        .content_type()
                        .unwrap_or(content_types::APPLICATION_OCTET_STREAM)
                        .to_string();
                    let bytes = field.bytes().await?;
                    // An untouched file input posts an empty, nameless part
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files
                        .push((name, UploadedFile::new(file_name, mime_type, bytes)));
                }
                None => {
                    let value = field.text().await?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    /// First non-blank text value among `aliases`, in alias order
    pub fn field(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.fields
                .iter()
                .filter(|(name, _)| name == alias)
                .map(|(_, value)| value.trim())
                .find(|value| !value.is_empty())
        })
    }

    /// Remove and return the first file uploaded under one of `aliases`
    pub fn take_file(&mut self, aliases: &[&str]) -> Option<UploadedFile> {
        let index = aliases.iter().find_map(|alias| {
            self.files
                .iter()
                .position(|(name, _)| name == alias)
        })?;
        Some(self.files.remove(index).1)
    }

    /// Every remaining file, whatever its field name
    pub fn into_files(self) -> Vec<UploadedFile> {
        self.files.into_iter().map(|(_, file)| file).collect()
    }
}

fn is_urlencoded(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with(content_types::APPLICATION_FORM_URLENCODED)
        })
}
