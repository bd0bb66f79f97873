//! Shared error type across vigil crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Rejected at setup time.
    Config,
    /// Shutting down; retry later.
    Unavailable,
    /// Missing or wrong access token.
    Forbidden,
    /// A value source failed while scraping.
    ScrapeFailed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::Config => "CONFIG",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::ScrapeFailed => "SCRAPE_FAILED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VigilError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("metric family already registered: {0}")]
    DuplicateFamily(String),
    #[error("label arity mismatch in {family}: expected {expected} values, got {actual}")]
    LabelArity {
        family: String,
        expected: usize,
        actual: usize,
    },
    #[error("admission denied: shutting down")]
    AdmissionDenied,
    #[error("access denied")]
    AccessDenied,
    #[error("value source failed: {0}")]
    Source(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl VigilError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VigilError::Config(_)
            | VigilError::InvalidName(_)
            | VigilError::DuplicateFamily(_)
            | VigilError::LabelArity { .. } => ClientCode::Config,
            VigilError::AdmissionDenied => ClientCode::Unavailable,
            VigilError::AccessDenied => ClientCode::Forbidden,
            VigilError::Source(_) => ClientCode::ScrapeFailed,
            VigilError::Internal(_) => ClientCode::Internal,
        }
    }
}
