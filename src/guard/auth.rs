//! Auth-required gate, with an optional role allow-list. Pure: it never
//! issues network traffic of its own and suspends only while the session
//! store is still resolving the initial identity.

use std::sync::Arc;

use crate::policy::{self, Decision, RouteRequirement};
use crate::routes::RouteTable;
use crate::session::SessionStore;
use crate::subject::Role;

pub struct AuthGuard {
    session: Arc<SessionStore>,
    routes: Arc<RouteTable>,
    requirement: RouteRequirement,
}

impl AuthGuard {
    pub fn new(session: Arc<SessionStore>, routes: Arc<RouteTable>) -> Self {
        Self { session, routes, requirement: RouteRequirement::auth_required() }
    }

    pub fn allow_role(mut self, role: Role) -> Self {
        self.requirement = self.requirement.allow_role(role);
        self
    }

    pub fn exempt<S: Into<String>>(mut self, path: S) -> Self {
        self.requirement = self.requirement.exempt(path);
        self
    }

    /// On Deny the view renders an inline "access denied / sign in" state
    /// with a manual link; this gate deliberately never navigates away, so
    /// the back button keeps working.
    pub fn evaluate(&self, current_path: &str) -> Decision {
        policy::evaluate(&self.session.snapshot(), &self.requirement, current_path, None, &self.routes)
    }
}
