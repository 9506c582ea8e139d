//! Axum handlers for the client-facing routes
//!
//! Handlers only extract and validate transport-level input; the work is
//! done by [`ProxyService`].

use crate::domain::{ArtifactId, ArtifactName, ContactMessage, DownloadRequest, NormalizedResult};
use crate::providers::constants::{client_fields::contact, error_messages};
use crate::proxy::form::InboundForm;
use crate::proxy::service::ProxyService;
use crate::proxy::types::{ProxyError, ProxyResult};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

pub const CONTACT_SENT: &str = "message sent";

/// Query of the artifact download route
#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub id: Option<String>,
    pub arq: Option<String>,
    #[serde(rename = "artifactName")]
    pub artifact_name: Option<String>,
}

impl DownloadParams {
    pub fn into_request(self) -> ProxyResult<DownloadRequest> {
        let missing =
            || ProxyError::InvalidInput(error_messages::MISSING_DOWNLOAD_PARAMS.to_string());

        let id = self
            .id
            .and_then(|id| ArtifactId::try_new(id).ok())
            .ok_or_else(missing)?;
        let artifact_name = self
            .arq
            .filter(|name| !name.trim().is_empty())
            .or(self.artifact_name)
            .and_then(|name| ArtifactName::try_new(name).ok())
            .ok_or_else(missing)?;

        Ok(DownloadRequest { id, artifact_name })
    }
}

pub async fn generate_document(
    State(service): State<Arc<ProxyService>>,
    form: InboundForm,
) -> ProxyResult<Json<NormalizedResult>> {
    service.generate_document(form).await.map(Json)
}

pub async fn verify_lookup(
    State(service): State<Arc<ProxyService>>,
    form: InboundForm,
) -> ProxyResult<Json<NormalizedResult>> {
    service.verify_lookup(form).await.map(Json)
}

pub async fn download_artifact(
    State(service): State<Arc<ProxyService>>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> ProxyResult<Response> {
    let Query(params) = params?;
    let request = params.into_request()?;
    service.download_artifact(&request).await
}

/// Contact form submission; replies with a `NormalizedResult` on every path
pub async fn send_contact_email(
    State(service): State<Arc<ProxyService>>,
    form: Result<InboundForm, ProxyError>,
) -> (StatusCode, Json<NormalizedResult>) {
    let form = match form {
        Ok(form) => form,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(NormalizedResult::error(e.to_string())),
            )
        }
    };

    let text = |name: &str| form.field(&[name]).unwrap_or_default().to_string();
    let email = text(contact::EMAIL);
    let subject_reason = text(contact::SUBJECT_REASON);
    let description = text(contact::DESCRIPTION);
    let message = ContactMessage {
        email,
        subject_reason,
        description,
        attachments: form.into_files(),
    };

    match service.send_contact(&message).await {
        Ok(()) => (
            StatusCode::OK,
            Json(NormalizedResult::ok().with_message(CONTACT_SENT)),
        ),
        Err(e) if e.is_client_error() => (
            StatusCode::BAD_REQUEST,
            Json(NormalizedResult::error(e.to_string())),
        ),
        Err(e) => {
            error!(error = %e, "Contact message could not be delivered");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(NormalizedResult::error(e.to_string())),
            )
        }
    }
}
