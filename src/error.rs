use serde::Serialize;
use thiserror::Error;

use crate::arr::Service;

/// Coarse category of a failure, exposed to tool callers next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotConfigured,
    InvalidInput,
    Unauthorized,
    NotFound,
    Duplicate,
    Unreachable,
    Backend,
    Decode,
}

#[derive(Debug, Error)]
pub enum ArrError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{service} authentication failed - verify your API key is correct")]
    Unauthorized { service: Service },

    #[error("{service}: {what} not found")]
    NotFound { service: Service, what: String },

    #[error("{service} already has {what}")]
    Duplicate {
        service: Service,
        what: String,
        library_id: Option<i64>,
    },

    #[error("{service} HTTP client could not be initialised: {source}")]
    HttpClient {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} is unreachable: {source}")]
    Unreachable {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {message}")]
    Backend {
        service: Service,
        status: u16,
        message: String,
    },

    #[error("failed to decode {service} response from {path}: {source}")]
    Decode {
        service: Service,
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ArrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArrError::NotConfigured(_) | ArrError::HttpClient { .. } => ErrorKind::NotConfigured,
            ArrError::InvalidInput(_) => ErrorKind::InvalidInput,
            ArrError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ArrError::NotFound { .. } => ErrorKind::NotFound,
            ArrError::Duplicate { .. } => ErrorKind::Duplicate,
            ArrError::Unreachable { .. } => ErrorKind::Unreachable,
            ArrError::Backend { .. } => ErrorKind::Backend,
            ArrError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Whether the backend answered at all. Only transport failures count as unreachable.
    pub fn backend_responded(&self) -> bool {
        matches!(
            self,
            ArrError::Unauthorized { .. }
                | ArrError::NotFound { .. }
                | ArrError::Duplicate { .. }
                | ArrError::Backend { .. }
                | ArrError::Decode { .. }
        )
    }

    pub(crate) fn not_configured(service: Service) -> Self {
        ArrError::NotConfigured(format!(
            "{service} API key not configured (set {})",
            service.api_key_var()
        ))
    }
}

pub type ArrResult<T> = Result<T, ArrError>;
