//! Request-scoped entities built from client input

use crate::domain::types::{AccessKey, ArtifactId, ArtifactName, ChallengeToken};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// File received in a multipart upload, held in memory for one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Kind of tax document a lookup refers to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Electronic invoice (model 55)
    #[default]
    Nfe,
    /// Electronic transport document (model 57)
    Cte,
}

impl DocumentType {
    /// Flag value the provider expects in the `tipo` field
    pub fn wire_flag(self) -> &'static str {
        match self {
            Self::Nfe => "nfe",
            Self::Cte => "cte",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_flag())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown document type '{0}'")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nfe" | "55" | "invoicea" => Ok(Self::Nfe),
            "cte" | "57" | "invoiceb" => Ok(Self::Cte),
            other => Err(UnknownDocumentType(other.to_string())),
        }
    }
}

/// Access-key lookup, validated before any upstream call is made
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupRequest {
    pub access_key: AccessKey,
    pub document_type: DocumentType,
    pub challenge_token: ChallengeToken,
}

/// Artifact download coordinates carried by generated links
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    pub id: ArtifactId,
    pub artifact_name: ArtifactName,
}

/// Message submitted through the contact form
#[derive(Clone, Debug)]
pub struct ContactMessage {
    pub email: String,
    pub subject_reason: String,
    pub description: String,
    pub attachments: Vec<UploadedFile>,
}
