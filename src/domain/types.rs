//! Validated scalar types used at the request boundary
//!
//! Inbound form fields and query parameters are converted into these
//! newtypes before anything is sent upstream, so a value that reaches the
//! provider layer has already passed its invariant.

use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};

/// Number of characters in a tax document access key
pub const ACCESS_KEY_LENGTH: usize = 44;

/// Fixed-length numeric identifier of a tax document
#[nutype(
    sanitize(trim),
    validate(predicate = |key: &str| {
        key.len() == ACCESS_KEY_LENGTH && key.chars().all(|c| c.is_ascii_digit())
    }),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct AccessKey(String);

/// Human-verification token supplied by the client (or a solver)
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, AsRef)
)]
pub struct ChallengeToken(String);

/// Opaque artifact id handed out by the provider
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct ArtifactId(String);

/// File name of a provider artifact
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Name suitable for a quoted `filename=` parameter
    pub fn disposition_filename(&self) -> String {
        self.as_ref()
            .chars()
            .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
            .collect()
    }
}
