//! Access policy evaluation. `evaluate` is a pure decision function over the
//! session snapshot, the route's declared requirement and any fresh check
//! record. First matching rule wins; Decisions are returned values, never
//! thrown, and never persisted beyond the current evaluation cycle.

use std::collections::HashSet;

use crate::cache::CheckRecord;
use crate::routes::{PreconditionKind, RouteTable};
use crate::session::SessionState;
use crate::subject::Role;

/// Static declaration of what a protected destination demands. `exempt_paths`
/// lets a remediation destination bypass its own gate, which is what prevents
/// redirect loops.
#[derive(Debug, Clone, Default)]
pub struct RouteRequirement {
    pub requires_auth: bool,
    /// Empty = any authenticated role.
    pub allowed_roles: HashSet<Role>,
    /// Inverse gate for sign-in/sign-up pages.
    pub public_only: bool,
    pub precondition: Option<PreconditionKind>,
    pub exempt_paths: HashSet<String>,
}

impl RouteRequirement {
    pub fn auth_required() -> Self {
        Self { requires_auth: true, ..Default::default() }
    }

    pub fn public_only() -> Self {
        Self { public_only: true, ..Default::default() }
    }

    pub fn allow_role(mut self, role: Role) -> Self {
        self.allowed_roles.insert(role);
        self
    }

    pub fn with_precondition(mut self, kind: PreconditionKind) -> Self {
        self.precondition = Some(kind);
        self
    }

    pub fn exempt<S: Into<String>>(mut self, path: S) -> Self {
        self.exempt_paths.insert(path.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    RoleMismatch,
    AlreadyAuthenticated,
    PreconditionUnmet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Pending,
    Allow,
    Deny { reason: DenyReason, remedy: Option<String> },
}

impl Decision {
    pub fn deny<S: Into<String>>(reason: DenyReason, remedy: S) -> Self {
        Decision::Deny { reason, remedy: Some(remedy.into()) }
    }

    pub fn is_allow(&self) -> bool { matches!(self, Decision::Allow) }
    pub fn is_pending(&self) -> bool { matches!(self, Decision::Pending) }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Deny { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

pub fn evaluate(
    session: &SessionState,
    requirement: &RouteRequirement,
    current_path: &str,
    record: Option<&CheckRecord>,
    routes: &RouteTable,
) -> Decision {
    // 1. Identity still resolving: no decision yet, regardless of anything else.
    if session.resolving {
        return Decision::Pending;
    }
    // 2. Remediation destinations are always reachable.
    if requirement.exempt_paths.contains(current_path) {
        return Decision::Allow;
    }

    let subject = session.subject.as_ref().filter(|s| s.is_authenticated());

    // 3. Authentication.
    if requirement.requires_auth && subject.is_none() {
        return Decision::deny(DenyReason::NotAuthenticated, routes.sign_in.clone());
    }
    // 4. Inverse gate for the public auth area.
    if requirement.public_only {
        if let Some(s) = subject {
            return Decision::deny(DenyReason::AlreadyAuthenticated, routes.dashboard_for(&s.role));
        }
    }
    // 5. Role allow-list.
    if !requirement.allowed_roles.is_empty() {
        if let Some(s) = subject {
            if !requirement.allowed_roles.contains(&s.role) {
                return Decision::deny(DenyReason::RoleMismatch, routes.dashboard_for(&s.role));
            }
        }
    }
    // 6. Precondition: no fresh record means the controller still has to
    //    fetch or compute one.
    if let Some(kind) = requirement.precondition {
        match record {
            None => return Decision::Pending,
            Some(rec) if !rec.satisfied => {
                return Decision::deny(DenyReason::PreconditionUnmet, routes.remedy_for(kind));
            }
            Some(_) => {}
        }
    }
    // 7.
    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PreconditionCache;
    use crate::subject::Subject;

    fn routes() -> RouteTable { RouteTable::default() }

    fn resolved(subject: Option<Subject>) -> SessionState {
        SessionState { subject, resolving: false }
    }

    fn patient() -> Subject {
        Subject { id: "u-1".into(), role: Role::patient(), email: None, phone: None }
    }

    #[test]
    fn resolving_session_is_always_pending() {
        let st = SessionState { subject: Some(patient()), resolving: true };
        let reqs = [
            RouteRequirement::auth_required(),
            RouteRequirement::public_only(),
            RouteRequirement::default().with_precondition(PreconditionKind::ProfileCompletion),
        ];
        for req in &reqs {
            assert!(evaluate(&st, req, "/anywhere", None, &routes()).is_pending());
        }
    }

    #[test]
    fn exempt_path_allows_even_when_subject_absent() {
        let req = RouteRequirement::auth_required()
            .with_precondition(PreconditionKind::ProfileCompletion)
            .exempt("/patient/profile/complete");
        let d = evaluate(&resolved(None), &req, "/patient/profile/complete", None, &routes());
        assert!(d.is_allow());
    }

    #[test]
    fn absent_subject_denies_with_sign_in_remedy() {
        let d = evaluate(&resolved(None), &RouteRequirement::auth_required(), "/patient/dashboard", None, &routes());
        assert_eq!(
            d,
            Decision::Deny {
                reason: DenyReason::NotAuthenticated,
                remedy: Some("/auth/sign-in".into())
            }
        );
    }

    #[test]
    fn empty_id_subject_counts_as_absent() {
        let ghost = Subject { id: "".into(), role: Role::patient(), email: None, phone: None };
        let d = evaluate(&resolved(Some(ghost)), &RouteRequirement::auth_required(), "/x", None, &routes());
        assert_eq!(d.deny_reason(), Some(DenyReason::NotAuthenticated));
    }

    #[test]
    fn public_only_bounces_signed_in_visitors_to_their_dashboard() {
        let d = evaluate(&resolved(Some(patient())), &RouteRequirement::public_only(), "/auth/sign-in", None, &routes());
        assert_eq!(
            d,
            Decision::Deny {
                reason: DenyReason::AlreadyAuthenticated,
                remedy: Some("/patient/dashboard".into())
            }
        );
    }

    #[test]
    fn public_only_allows_anonymous_visitors() {
        let d = evaluate(&resolved(None), &RouteRequirement::public_only(), "/auth/sign-in", None, &routes());
        assert!(d.is_allow());
    }

    #[test]
    fn role_mismatch_routes_to_own_dashboard() {
        let req = RouteRequirement::auth_required().allow_role(Role::clinic_admin());
        let d = evaluate(&resolved(Some(patient())), &req, "/provider/dashboard", None, &routes());
        assert_eq!(
            d,
            Decision::Deny {
                reason: DenyReason::RoleMismatch,
                remedy: Some("/patient/dashboard".into())
            }
        );
    }

    #[test]
    fn empty_allow_list_admits_any_authenticated_role() {
        let req = RouteRequirement::auth_required();
        let mut odd = patient();
        odd.role = Role::new("some_future_role");
        assert!(evaluate(&resolved(Some(odd)), &req, "/shared", None, &routes()).is_allow());
    }

    #[test]
    fn precondition_without_record_is_pending() {
        let req = RouteRequirement::default().with_precondition(PreconditionKind::ProfileCompletion);
        let d = evaluate(&resolved(Some(patient())), &req, "/patient/dashboard", None, &routes());
        assert!(d.is_pending());
    }

    #[test]
    fn unsatisfied_record_denies_with_remedy_path() {
        let cache = PreconditionCache::default();
        cache.put("u-1", PreconditionKind::ProfileCompletion, false);
        let rec = cache.get("u-1", PreconditionKind::ProfileCompletion).unwrap();
        let req = RouteRequirement::default().with_precondition(PreconditionKind::ProfileCompletion);
        let d = evaluate(&resolved(Some(patient())), &req, "/patient/dashboard", Some(&rec), &routes());
        assert_eq!(
            d,
            Decision::Deny {
                reason: DenyReason::PreconditionUnmet,
                remedy: Some("/patient/profile/complete".into())
            }
        );
    }

    #[test]
    fn satisfied_record_allows() {
        let cache = PreconditionCache::default();
        cache.put("u-1", PreconditionKind::ClinicRegistered, true);
        let rec = cache.get("u-1", PreconditionKind::ClinicRegistered).unwrap();
        let req = RouteRequirement::default().with_precondition(PreconditionKind::ClinicRegistered);
        let d = evaluate(&resolved(Some(patient())), &req, "/provider/dashboard", Some(&rec), &routes());
        assert!(d.is_allow());
    }
}
