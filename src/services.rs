//! Remote collaborator contracts. Implemented by the portal's API client
//! elsewhere; the engine consumes them behind trait objects so tests can
//! inject counted fakes.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileCompletion {
    /// 0-100 completeness score.
    pub percent: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClinicRef {
    pub clinic_id: String,
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Completeness score for the subject's profile. `NotFound` when no
    /// profile exists yet (an expected outcome, not a fault).
    async fn profile_completion(&self, subject_id: &str) -> Result<ProfileCompletion, ServiceError>;
}

#[async_trait]
pub trait ClinicService: Send + Sync {
    /// The clinic associated with this administrator; `NotFound` when none
    /// has been registered.
    async fn clinic_for_admin(&self, subject_id: &str) -> Result<ClinicRef, ServiceError>;
}
