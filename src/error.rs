// src/error.rs
//! Application error types with structured error handling.
//!
//! Each variant names what went wrong and where. Whether a failure is
//! block-scoped, page-scoped or fatal is decided by the caller that catches
//! it, not by the variant.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded
    RateLimited,
    /// The requested object does not exist or is not shared with the integration
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "validation_error" => Self::ValidationFailed,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Could not resolve the page owning block {block_id}: {reason}")]
    UnresolvedOwner { block_id: String, reason: String },

    #[error("Path error: {0}")]
    PathError(String),

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),

    #[error(transparent)]
    NotionClient(#[from] NotionClientError),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => AppError::Io(io),
            None => AppError::PathError("filesystem loop detected while walking".to_string()),
        }
    }
}

/// Failures while turning Notion JSON into domain types.
#[derive(Error, Debug)]
pub enum NotionClientError {
    #[error("Failed to deserialize response: {source}\nBody: {body}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Type conversion error: {message}")]
    ConversionError { message: String },
}

impl AppError {
    /// Whether the remote API reported the object as missing or unshared.
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotionService { code, .. } => *code == NotionErrorCode::ObjectNotFound,
            _ => false,
        }
    }

    /// Whether repeating the request cannot change the outcome: the object
    /// is missing or the credentials are refused.
    pub fn is_permanent(&self) -> bool {
        match self {
            AppError::NotionService { code, .. } => matches!(
                code,
                NotionErrorCode::ObjectNotFound
                    | NotionErrorCode::Unauthorized
                    | NotionErrorCode::RestrictedResource
                    | NotionErrorCode::HttpStatus(401 | 403 | 404)
            ),
            _ => false,
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trips_through_display() {
        let code = NotionErrorCode::from_api_response("object_not_found");
        assert_eq!(code, NotionErrorCode::ObjectNotFound);
        assert_eq!(code.to_string(), "object_not_found");
        assert_eq!(NotionErrorCode::from_http_status(502).to_string(), "http_502");
    }

    #[test]
    fn test_not_found_detection() {
        let err = AppError::NotionService {
            code: NotionErrorCode::ObjectNotFound,
            message: "gone".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        assert!(err.is_not_found());
        assert!(!AppError::PathError("x".into()).is_not_found());
    }

    #[test]
    fn test_permanent_failures() {
        let service = |code| AppError::NotionService {
            code,
            message: String::new(),
            status: reqwest::StatusCode::BAD_REQUEST,
        };
        assert!(service(NotionErrorCode::ObjectNotFound).is_permanent());
        assert!(service(NotionErrorCode::Unauthorized).is_permanent());
        assert!(service(NotionErrorCode::HttpStatus(401)).is_permanent());
        assert!(!service(NotionErrorCode::ServiceUnavailable).is_permanent());
        assert!(!service(NotionErrorCode::RateLimited).is_permanent());
        assert!(!AppError::MalformedResponse("x".into()).is_permanent());
    }
}
