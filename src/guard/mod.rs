//! Route guard controllers, one per protection flavour. Keep the public
//! surface thin and split implementation across sub-modules.
//!
//! Each controller runs one evaluation cycle per distinct subject identity.
//! An explicit `(id, role)` memo per controller instance, compared on every
//! call, replaces the has-checked flags the portal shell used to tie to
//! component identity; it is what prevents re-check storms and render loops.

mod auth;
mod clinic;
mod profile;
mod public_only;

pub use auth::AuthGuard;
pub use clinic::ClinicGuard;
pub use profile::ProfileGuard;
pub use public_only::PublicOnlyGuard;

use crate::subject::{Role, Subject};

/// Identity key a controller cycles on. Role is part of the key so a role
/// switch (impersonation) restarts the cycle the same way a fresh login does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubjectKey {
    pub id: String,
    pub role: Role,
}

impl SubjectKey {
    pub fn of(subject: &Subject) -> Self {
        Self { id: subject.id.clone(), role: subject.role.clone() }
    }
}

/// Per-subject state machine for the precondition guards:
/// Idle -> Checking -> Resolved, reset whenever the subject key changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CheckCycle {
    #[default]
    Idle,
    /// A remote check is in flight for the current subject. A second attempt
    /// for the same subject is suppressed, not queued or raced.
    Checking,
    /// The one check for this subject has settled. Further remote traffic
    /// only happens once the cached record ages out of the freshness window.
    Resolved,
}
