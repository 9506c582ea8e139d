//! Human-verification challenge handling for key lookups
//!
//! Browsers submit a challenge token with every lookup. When a verification
//! secret is configured, the token is checked with the verification service
//! before the provider is contacted. A [`ChallengeSolver`] can be plugged in
//! to obtain a token when the client did not send one.

use crate::config::ChallengeSettings;
use crate::domain::{AccessKey, ChallengeToken};
use crate::providers::constants::error_messages;
use crate::providers::{ProviderError, ProviderResult};
use crate::proxy::types::{ProxyError, ProxyResult, TargetUrl};
use crate::proxy::upstream::UpstreamClient;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

/// Obtains a challenge token on behalf of the client
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Solve the challenge presented on `page_url` for a lookup of `access_key`
    async fn solve(&self, page_url: &str, access_key: &AccessKey)
        -> ProviderResult<ChallengeToken>;
}

/// Reply of the verification service
#[derive(Debug, Deserialize)]
struct VerificationOutcome {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Server-side check of client challenge tokens
#[derive(Clone, Debug)]
pub struct ChallengeVerifier {
    verify_url: TargetUrl,
    secret: String,
}

impl ChallengeVerifier {
    pub fn new(verify_url: TargetUrl, secret: impl Into<String>) -> Self {
        Self {
            verify_url,
            secret: secret.into(),
        }
    }

    /// Verifier for the configured secret, or `None` when tokens pass through
    pub fn from_settings(settings: &ChallengeSettings) -> ProviderResult<Option<Self>> {
        let Some(secret) = settings
            .secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        let verify_url = TargetUrl::try_new(settings.verify_url.clone())
            .map_err(|_| ProviderError::InvalidUrl(settings.verify_url.clone()))?;

        Ok(Some(Self::new(verify_url, secret)))
    }

    /// Confirm a token with the verification service
    pub async fn verify(&self, client: &UpstreamClient, token: &ChallengeToken) -> ProxyResult<()> {
        let reply = client
            .post_form(
                &self.verify_url,
                &[("secret", self.secret.as_str()), ("response", token.as_ref())],
            )
            .await?;

        if !reply.is_success() {
            warn!(status = reply.status, "Challenge verification service failed");
            return Err(ProxyError::Internal(format!(
                "challenge verification service returned {}",
                reply.status
            )));
        }

        let outcome: VerificationOutcome = serde_json::from_str(&reply.body).map_err(|e| {
            ProxyError::Internal(format!("unreadable challenge verification reply: {e}"))
        })?;

        if outcome.success {
            info!("Challenge token verified");
            Ok(())
        } else {
            warn!(error_codes = ?outcome.error_codes, "Challenge token rejected");
            Err(ProxyError::InvalidInput(
                error_messages::CHALLENGE_REJECTED.to_string(),
            ))
        }
    }
}
