//! Constants for Document Provider interactions
//!
//! This module centralizes the field names, markers and messages used when
//! talking to the provider and to clients, so the translator, normalizer
//! and handlers agree on them.

/// Field names accepted from browser forms (first entry is canonical)
pub mod client_fields {
    pub const FILE: &[&str] = &["arquivo", "file"];
    pub const ACCESS_KEY: &[&str] = &["accessKey", "chave"];
    pub const CHALLENGE_TOKEN: &[&str] = &["challengeToken", "captcha", "g-recaptcha-response"];
    pub const DOCUMENT_TYPE: &[&str] = &["documentType", "tipo"];

    /// Contact form fields
    pub mod contact {
        pub const EMAIL: &str = "email";
        pub const SUBJECT_REASON: &str = "subject-reason";
        pub const DESCRIPTION: &str = "description";
    }
}

/// Field and query parameter names on the provider's wire
pub mod upstream_fields {
    pub const COMMAND: &str = "t";
    pub const FILE: &str = "arquivo";
    pub const FILE_COUNT: &str = "arquivos";
    pub const FILE_NAME: &str = "nomedoarquivo";
    pub const CACHE_BUSTER: &str = "r";
    pub const ACCESS_KEY: &str = "chave";
    pub const CHALLENGE_TOKEN: &str = "captcha";
    pub const DOCUMENT_TYPE: &str = "tipo";
    pub const ARTIFACT_ID: &str = "id";
    pub const ARTIFACT_NAME: &str = "arq";
}

/// JSON field names found in provider and verifier replies
pub mod json_fields {
    pub const PDF_LINK: &str = "pdfLink";
    pub const XML_LINK: &str = "xmlLink";
    pub const ID: &str = "id";
    pub const ARTIFACT_NAME: &str = "artifactName";
    pub const ARTIFACT_NAME_SHORT: &str = "arq";
}

/// Body markers used to classify replies
pub mod markers {
    /// Lowercase prefixes identifying an HTML document
    pub const HTML_DOCUMENT: &[&str] = &["<!doctype html", "<html"];
    pub const CONFIRMATION_OK: &str = "OK";
    pub const PDF_SUFFIX: &str = ".pdf";
    pub const XML_SUFFIX: &str = ".xml";
}

/// HTTP-related constants
pub mod http {
    pub mod content_types {
        pub const APPLICATION_ZIP: &str = "application/zip";
        pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
        pub const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    }
}

/// Error message constants
pub mod error_messages {
    pub const HTML_ERROR_PAGE: &str = "upstream returned an HTML error page";
    pub const UNEXPECTED_HTML: &str = "unexpected HTML from upstream";
    pub const NOT_JSON: &str = "upstream response is not valid JSON";
    pub const UNRECOGNIZED_SHAPE: &str = "unrecognized upstream response shape";
    pub const EMPTY_FILE: &str = "the uploaded file is empty";
    pub const MISSING_INPUT: &str = "no file or access key was provided";
    pub const INVALID_ACCESS_KEY: &str = "accessKey must be exactly 44 digits";
    pub const MISSING_CHALLENGE_TOKEN: &str = "challengeToken is required";
    pub const CHALLENGE_REJECTED: &str = "challenge verification failed";
    pub const MISSING_DOWNLOAD_PARAMS: &str = "parameters 'id' and 'arq' are required";
}

/// Limits applied when shaping requests and error details
pub mod limits {
    /// Characters of an HTML error page kept as error detail
    pub const ERROR_DETAIL_CHARS: usize = 500;
    /// Characters of an upstream body written to the log
    pub const LOG_PREVIEW_CHARS: usize = 500;
    /// Upper bound (inclusive) of the cache-busting query parameter
    pub const CACHE_BUSTER_MAX: u16 = 9999;
}
