use thiserror::Error;

/// Failure of a content tool call, surfaced to the agent as a tool error.
/// Every variant renders a message that names what went wrong and where,
/// so the protocol layer can surface it verbatim.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Upstream answered with a non-success status
    #[error("Upstream request failed: {status} {status_text} for {url}: {body}")]
    Upstream {
        status: u16,
        status_text: String,
        url: String,
        /// At most [`BODY_SNIPPET_MAX_CHARS`] characters of the response body
        body: String,
    },
    /// Upstream could not be reached at all
    #[error("Failed to reach upstream at {url}: {message}")]
    UpstreamConnection { url: String, message: String },
    /// Upstream answered 2xx but the body was not valid JSON
    #[error("Upstream returned malformed JSON from {url}: {message}")]
    MalformedJson { url: String, message: String },
    /// Slug or identifier absent from a fetched content map
    #[error("No item with {key_kind} '{key}' in content type '{content_type}'")]
    NotFound {
        key_kind: &'static str,
        key: String,
        content_type: String,
    },
    /// Rejected before any network call
    #[error("{message}")]
    InvalidInput { field: String, message: String },
    #[error("Invalid alias table: {0}")]
    InvalidAliasTable(String),
}

/// Upper bound on the response body excerpt carried by [`ContentError::Upstream`].
pub const BODY_SNIPPET_MAX_CHARS: usize = 200;

impl ContentError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Upstream { .. } | Self::UpstreamConnection { .. } | Self::MalformedJson { .. } => {
                codes::UPSTREAM_ERROR
            }
            Self::NotFound { .. } => codes::NOT_FOUND,
            Self::InvalidInput { .. } => codes::VALIDATION_FAILED,
            Self::InvalidAliasTable(_) => codes::INVALID_CONFIG,
        }
    }

    /// Which input field caused the error (if applicable)
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidInput { field, .. } => Some(field),
            Self::NotFound { key_kind, .. } => Some(key_kind),
            _ => None,
        }
    }
}

/// Truncate an upstream body to the snippet carried in errors.
pub fn body_snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_MAX_CHARS).collect()
}

/// Error codes used across the adapter
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const INVALID_CONFIG: &str = "invalid_config";
}
