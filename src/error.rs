// ABOUTME: Phase error taxonomy for the orchestration core.
// ABOUTME: Distinguishes precondition, domain, and unexpected failures explicitly.

use thiserror::Error;

/// Error codes carried by known domain failures.
///
/// These originate from collaborators (delegate, secret manager, provider)
/// and are preserved end-to-end so the surrounding engine can render a
/// precise message instead of a generic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    AccessDenied,
    VaultOperationError,
    ProviderOperationFailed,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::VaultOperationError => "VAULT_OPERATION_ERROR",
            ErrorCode::ProviderOperationFailed => "PROVIDER_OPERATION_FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Errors surfaced by phase execution and async-response handling.
///
/// The variant determines the engine's reaction: `InvalidRequest` and
/// `Unexpected` abort the phase without retry, `Domain` propagates the
/// collaborator's error code unchanged. Remote FAILURE responses are not
/// errors at all; they become a terminal FAILED execution status.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// A precondition is missing or malformed. Fatal, not retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A known, typed failure raised by a collaborator. Propagated unchanged.
    #[error("{code}: {message}")]
    Domain { code: ErrorCode, message: String },

    /// Anything else. Wrapped rather than leaked as a raw internal type,
    /// with the original message preserved for logs.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl PhaseError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        PhaseError::InvalidRequest(message.into())
    }

    /// The domain error code, when this is a known domain failure.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            PhaseError::Domain { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PhaseError>;
