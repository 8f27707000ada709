//! Subject and role model. The role taxonomy is configuration data owned by
//! the server contract, not a closed enum: unknown role strings must flow
//! through every API without panicking.

use serde::{Deserialize, Serialize};

/// Case-normalising role wrapper. Constructors exist for the roles the portal
/// ships with today; anything else still round-trips intact. Deserialisation
/// funnels through `Role::new` so config-sourced roles compare equal to
/// code-built ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Role(String);

impl From<String> for Role {
    fn from(s: String) -> Self { Role::new(s) }
}

impl Role {
    pub fn new<S: Into<String>>(s: S) -> Self { Role(s.into().trim().to_ascii_lowercase()) }
    pub fn as_str(&self) -> &str { &self.0 }

    pub fn patient() -> Self { Role::new("patient") }
    pub fn clinic_admin() -> Self { Role::new("clinic_admin") }
    pub fn provider_staff() -> Self { Role::new("provider_staff") }
    pub fn ngo_partner() -> Self { Role::new("ngo_partner") }
    pub fn admin() -> Self { Role::new("admin") }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// The resolved identity of the current visitor. Immutable once constructed:
/// replaced wholesale on login, cleared to absent on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Subject {
    /// A subject with an empty id is never treated as authenticated.
    pub fn is_authenticated(&self) -> bool { !self.id.trim().is_empty() }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    /// Email address or phone number, whichever the visitor signed up with.
    pub identifier: String,
    pub password: String,
}
