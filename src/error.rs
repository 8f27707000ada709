//! Error model for the gating engine. Deny outcomes are ordinary `Decision`
//! values (see `policy`); the types here cover the genuinely fallible seams:
//! credential checks, durable client storage and the remote precondition
//! services.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid_credentials")]
    InvalidCredentials,
    /// Persisted or backend-supplied identity failed structural validation.
    /// Diagnostic only: callers treat the identity as absent, never as fatal.
    #[error("identity_malformed: {0}")]
    IdentityMalformed(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("auth_backend: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Failure surface of the remote precondition services (profile completion,
/// clinic lookup). `NotFound` is an expected business outcome ("definitely
/// unmet"), not a fault; everything else triggers the fail-open path.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not_found")]
    NotFound,
    #[error("transport: {0}")]
    Transport(#[source] anyhow::Error),
    #[error("malformed_response: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool { matches!(self, ServiceError::NotFound) }
}
