//! Main proxy service implementation
//!
//! The `ProxyService` owns everything a request needs: the upstream HTTP
//! client, the provider translator and normalizer, the optional challenge
//! collaborators and the contact mailer. It is built once at startup and
//! shared read-only between request tasks.
//!
//! ## Service Lifecycle
//!
//! ```rust,ignore
//! use danfe_proxy::config::Settings;
//! use danfe_proxy::proxy::ProxyService;
//!
//! let settings = Settings::new()?;
//! let router = ProxyService::new(&settings)?.into_router(&settings.application)?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, router).await?;
//! ```

use crate::config::{ApplicationSettings, Settings};
use crate::domain::{
    AccessKey, ChallengeToken, ContactMessage, DocumentType, DownloadRequest, LookupRequest,
    NormalizedResult,
};
use crate::infrastructure::email::{ContactMailer, MailError};
use crate::providers::constants::{client_fields, error_messages};
use crate::providers::{
    ChallengeSolver, ChallengeVerifier, Operation, RequestTranslator, ResponseNormalizer,
};
use crate::proxy::error_response::ErrorResponseExt;
use crate::proxy::form::InboundForm;
use crate::proxy::handlers;
use crate::proxy::headers::paths;
use crate::proxy::middleware_stack::ProxyMiddlewareStack;
use crate::proxy::relay::relay_artifact;
use crate::proxy::types::{ProxyError, ProxyResult};
use crate::proxy::upstream::UpstreamClient;
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Forwarding service shared by all request handlers
pub struct ProxyService {
    upstream: UpstreamClient,
    translator: RequestTranslator,
    normalizer: ResponseNormalizer,
    verifier: Option<ChallengeVerifier>,
    solver: Option<Arc<dyn ChallengeSolver>>,
    solver_page_url: String,
    mailer: ContactMailer,
}

impl ProxyService {
    pub fn new(settings: &Settings) -> crate::Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(settings.provider.request_timeout())?,
            translator: RequestTranslator::new(&settings.provider),
            normalizer: ResponseNormalizer::new(settings.provider.relay_base_url.clone()),
            verifier: ChallengeVerifier::from_settings(&settings.challenge)
                .map_err(ProxyError::from)?,
            solver: None,
            solver_page_url: settings.challenge.solver_page_url.clone(),
            mailer: ContactMailer::new(&settings.email)?,
        })
    }

    /// Obtain challenge tokens with `solver` when the client sends none
    pub fn with_solver(mut self, solver: Arc<dyn ChallengeSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Create an Axum router for the proxy service with middleware
    pub fn into_router(self, settings: &ApplicationSettings) -> crate::Result<Router> {
        let middleware_stack = ProxyMiddlewareStack::from_settings(settings)?;

        let router = Router::new()
            .route(paths::HEALTH, get(health_handler))
            .route(paths::GENERATE_DOCUMENT, post(handlers::generate_document))
            .route(
                paths::legacy::GENERATE_DOCUMENT,
                post(handlers::generate_document),
            )
            .route(paths::DOWNLOAD_ARTIFACT, get(handlers::download_artifact))
            .route(
                paths::legacy::DOWNLOAD_ARTIFACT,
                get(handlers::download_artifact),
            )
            .route(paths::VERIFY_LOOKUP, post(handlers::verify_lookup))
            .route(paths::SEND_CONTACT_EMAIL, post(handlers::send_contact_email))
            .with_state(Arc::new(self));

        Ok(middleware_stack.apply_to_router(router))
    }

    /// Generate a document from an uploaded file or, failing that, an access key
    #[instrument(skip_all)]
    pub async fn generate_document(&self, mut form: InboundForm) -> ProxyResult<NormalizedResult> {
        let operation = if let Some(file) = form.take_file(client_fields::FILE) {
            Operation::SubmitFile(file)
        } else if form.field(client_fields::ACCESS_KEY).is_some() {
            Operation::LookupByKey(self.lookup_request(&form).await?)
        } else {
            return Err(ProxyError::InvalidInput(
                error_messages::MISSING_INPUT.to_string(),
            ));
        };

        let reply = self.forward(operation).await?;
        Ok(self.normalizer.normalize_document(&reply)?)
    }

    /// Ask the provider whether an access key can be looked up
    #[instrument(skip_all)]
    pub async fn verify_lookup(&self, form: InboundForm) -> ProxyResult<NormalizedResult> {
        let lookup = self.lookup_request(&form).await?;
        let reply = self.forward(Operation::ConfirmLookup(lookup)).await?;
        Ok(self.normalizer.normalize_confirmation(&reply)?)
    }

    pub async fn download_artifact(&self, request: &DownloadRequest) -> ProxyResult<Response> {
        relay_artifact(&self.upstream, &self.translator, request).await
    }

    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError> {
        self.mailer.send_contact(message).await
    }

    async fn forward(&self, operation: Operation) -> ProxyResult<crate::providers::UpstreamReply> {
        info!(operation = operation.name(), "Forwarding to provider");
        let request = self.translator.translate(operation)?;
        self.upstream.execute(request).await
    }

    /// Validate lookup fields in order: access key, document type, then token
    ///
    /// Nothing is sent upstream until every field is valid.
    async fn lookup_request(&self, form: &InboundForm) -> ProxyResult<LookupRequest> {
        let access_key = form
            .field(client_fields::ACCESS_KEY)
            .and_then(|key| AccessKey::try_new(key.to_string()).ok())
            .ok_or_else(|| {
                ProxyError::InvalidInput(error_messages::INVALID_ACCESS_KEY.to_string())
            })?;

        let document_type = match form.field(client_fields::DOCUMENT_TYPE) {
            Some(value) => value
                .parse::<DocumentType>()
                .map_err(|e| ProxyError::InvalidInput(e.to_string()))?,
            None => DocumentType::default(),
        };

        let client_token = form
            .field(client_fields::CHALLENGE_TOKEN)
            .and_then(|token| ChallengeToken::try_new(token.to_string()).ok());

        let challenge_token = match (client_token, &self.solver) {
            (Some(token), _) => {
                if let Some(verifier) = &self.verifier {
                    verifier.verify(&self.upstream, &token).await?;
                }
                token
            }
            (None, Some(solver)) => {
                info!("No challenge token supplied, solving on the client's behalf");
                solver.solve(&self.solver_page_url, &access_key).await?
            }
            (None, None) => {
                return Err(ProxyError::InvalidInput(
                    error_messages::MISSING_CHALLENGE_TOKEN.to_string(),
                ))
            }
        };

        Ok(LookupRequest {
            access_key,
            document_type,
            challenge_token,
        })
    }
}

/// Error conversion for Axum responses using standardized format
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();
        error_response.into_response_with_status(status)
    }
}

/// Health check handler
async fn health_handler() -> &'static str {
    "OK"
}
