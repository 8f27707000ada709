//! Inverse gate for the public auth area (sign-in, sign-up): visitors who are
//! already signed in get an inline "go to your dashboard" state instead of
//! the form. Pure, like the auth gate.

use std::sync::Arc;

use crate::policy::{self, Decision, RouteRequirement};
use crate::routes::RouteTable;
use crate::session::SessionStore;

pub struct PublicOnlyGuard {
    session: Arc<SessionStore>,
    routes: Arc<RouteTable>,
    requirement: RouteRequirement,
}

impl PublicOnlyGuard {
    pub fn new(session: Arc<SessionStore>, routes: Arc<RouteTable>) -> Self {
        Self { session, routes, requirement: RouteRequirement::public_only() }
    }

    pub fn exempt<S: Into<String>>(mut self, path: S) -> Self {
        self.requirement = self.requirement.exempt(path);
        self
    }

    pub fn evaluate(&self, current_path: &str) -> Decision {
        policy::evaluate(&self.session.snapshot(), &self.requirement, current_path, None, &self.routes)
    }
}
