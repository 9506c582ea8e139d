//! HTTP header constants and route paths for the proxy service

use ::http::header;

/// Header name for request ID used for tracing and correlation
pub const X_REQUEST_ID: &str = crate::proxy::types::REQUEST_ID_HEADER;

/// Standard header re-exports for convenience
pub use header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};

/// Well-known paths
pub mod paths {
    pub const GENERATE_DOCUMENT: &str = "/generate-document";
    pub const DOWNLOAD_ARTIFACT: &str = "/download-artifact";
    pub const VERIFY_LOOKUP: &str = "/verify-lookup";
    pub const SEND_CONTACT_EMAIL: &str = "/send-contact-email";

    /// Health check endpoint path
    pub const HEALTH: &str = "/health";

    /// Route names used by earlier frontends
    pub mod legacy {
        pub const GENERATE_DOCUMENT: &str = "/proxy-fsist-gerarpdf";
        pub const DOWNLOAD_ARTIFACT: &str = "/proxy-fsist-downloadzip";
    }
}

/// Common content types (re-exported from centralized constants)
pub mod content_types {
    pub use crate::providers::constants::http::content_types::*;
}

/// `attachment` disposition for a sanitized file name
pub fn attachment_disposition(file_name: &str) -> String {
    format!("attachment; filename=\"{file_name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_absolute() {
        for path in [
            paths::GENERATE_DOCUMENT,
            paths::DOWNLOAD_ARTIFACT,
            paths::VERIFY_LOOKUP,
            paths::SEND_CONTACT_EMAIL,
            paths::HEALTH,
            paths::legacy::GENERATE_DOCUMENT,
            paths::legacy::DOWNLOAD_ARTIFACT,
        ] {
            assert!(path.starts_with('/'), "{path}");
        }
        assert!(X_REQUEST_ID.starts_with("x-"));
    }

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            attachment_disposition("nota.pdf"),
            "attachment; filename=\"nota.pdf\""
        );
    }
}
