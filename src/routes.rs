//! Route lookup tables consumed by the policy evaluator and the view layer.
//! Dashboard mapping is total: unknown roles land on the public landing page,
//! never a panic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::subject::Role;

/// Business-state requirements beyond authentication/role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionKind {
    ProfileCompletion,
    ClinicRegistered,
}

/// Navigation targets for the gate decisions. Deserializable so an app shell
/// can extend the role->dashboard table from configuration instead of code.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteTable {
    #[serde(default = "d_sign_in")]
    pub sign_in: String,
    #[serde(default = "d_landing")]
    pub landing: String,
    #[serde(default = "d_dashboards")]
    pub dashboards: HashMap<Role, String>,
    #[serde(default = "d_complete_profile")]
    pub complete_profile: String,
    #[serde(default = "d_register_clinic")]
    pub register_clinic: String,
}

fn d_sign_in() -> String { "/auth/sign-in".into() }
fn d_landing() -> String { "/".into() }
fn d_complete_profile() -> String { "/patient/profile/complete".into() }
fn d_register_clinic() -> String { "/provider/clinic/register".into() }

fn d_dashboards() -> HashMap<Role, String> {
    let mut m = HashMap::new();
    m.insert(Role::patient(), "/patient/dashboard".to_string());
    m.insert(Role::clinic_admin(), "/provider/dashboard".to_string());
    m.insert(Role::provider_staff(), "/provider/dashboard".to_string());
    m.insert(Role::ngo_partner(), "/partner/dashboard".to_string());
    m.insert(Role::admin(), "/admin/dashboard".to_string());
    m
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            sign_in: d_sign_in(),
            landing: d_landing(),
            dashboards: d_dashboards(),
            complete_profile: d_complete_profile(),
            register_clinic: d_register_clinic(),
        }
    }
}

impl RouteTable {
    /// Total over any role string; unrecognised roles route to the landing page.
    pub fn dashboard_for(&self, role: &Role) -> &str {
        self.dashboards.get(role).map(|p| p.as_str()).unwrap_or(self.landing.as_str())
    }

    /// Remediation destination for an unmet precondition.
    pub fn remedy_for(&self, kind: PreconditionKind) -> &str {
        match kind {
            PreconditionKind::ProfileCompletion => self.complete_profile.as_str(),
            PreconditionKind::ClinicRegistered => self.register_clinic.as_str(),
        }
    }
}
