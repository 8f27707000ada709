//! Single source of truth for "who is the current visitor, and is that still
//! being determined". Construct one store per app session and share it behind
//! an Arc; no ambient globals, so tests can instantiate fresh ones per case.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::PreconditionCache;
use crate::error::GateError;
use crate::storage::{ClientStorage, IDENTITY_KEY};
use crate::subject::{Credentials, Subject};

/// Snapshot of the session cell. `resolving` is true only during the initial
/// identity resolution and for the duration of a login call.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub subject: Option<Subject>,
    pub resolving: bool,
}

/// Durable identity record as stored under `IDENTITY_KEY`.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIdentity {
    subject: Subject,
    saved_at: DateTime<Utc>,
}

/// Remote authentication collaborator. Token issuance, refresh and MFA all
/// live behind this seam; the engine only consumes the resolved subject.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Subject, GateError>;
}

pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn ClientStorage>,
    backend: Arc<dyn AuthBackend>,
    cache: Arc<PreconditionCache>,
    init_done: OnceCell<()>,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn ClientStorage>,
        backend: Arc<dyn AuthBackend>,
        cache: Arc<PreconditionCache>,
    ) -> Self {
        Self {
            state: RwLock::new(SessionState { subject: None, resolving: true }),
            storage,
            backend,
            cache,
            init_done: OnceCell::new(),
        }
    }

    /// Resolve the initial identity from durable storage. Runs once per store
    /// lifetime; later calls are no-ops. Always lands in `resolving = false`,
    /// malformed persisted data included (treated as absent, never fatal).
    pub fn initialize(&self) {
        self.init_done.get_or_init(|| {
            let subject = self.read_persisted();
            let mut st = self.state.write();
            st.subject = subject;
            st.resolving = false;
        });
    }

    fn read_persisted(&self) -> Option<Subject> {
        let raw = self.storage.get(IDENTITY_KEY)?;
        match serde_json::from_str::<PersistedIdentity>(&raw) {
            Ok(rec) if rec.subject.is_authenticated() => {
                debug!(target: "caregate::session", "restored identity subject={} role={}", rec.subject.id, rec.subject.role);
                Some(rec.subject)
            }
            Ok(rec) => {
                warn!(
                    target: "caregate::session",
                    "{}",
                    GateError::IdentityMalformed(format!("persisted subject has empty id (saved_at={})", rec.saved_at))
                );
                self.storage.remove(IDENTITY_KEY);
                None
            }
            Err(e) => {
                warn!(target: "caregate::session", "{}", GateError::IdentityMalformed(e.to_string()));
                self.storage.remove(IDENTITY_KEY);
                None
            }
        }
    }

    /// Authenticate against the backend. `resolving` is true for the duration
    /// of the call; on failure the prior subject is left untouched and the
    /// error comes back as a value, never a panic.
    pub async fn login(&self, credentials: &Credentials) -> Result<Subject, GateError> {
        self.state.write().resolving = true;
        match self.backend.authenticate(credentials).await {
            Ok(subject) => {
                if !subject.is_authenticated() {
                    self.state.write().resolving = false;
                    return Err(GateError::IdentityMalformed("backend returned subject with empty id".into()));
                }
                if let Err(e) = self.persist(&subject) {
                    // Session continues in-memory; the visitor just signs in
                    // again after the next full reload.
                    warn!(target: "caregate::session", "identity persistence failed: {}", e);
                }
                let mut st = self.state.write();
                st.subject = Some(subject.clone());
                st.resolving = false;
                debug!(target: "caregate::session", "login subject={} role={}", subject.id, subject.role);
                Ok(subject)
            }
            Err(e) => {
                self.state.write().resolving = false;
                Err(e)
            }
        }
    }

    fn persist(&self, subject: &Subject) -> Result<(), GateError> {
        let rec = PersistedIdentity { subject: subject.clone(), saved_at: Utc::now() };
        let raw = serde_json::to_string(&rec).map_err(|e| GateError::Storage(e.to_string()))?;
        self.storage.set(IDENTITY_KEY, &raw)
    }

    /// Clear the subject, the persisted identity and the outgoing subject's
    /// cached precondition records in one step: no observer may see an absent
    /// subject alongside stale records for it.
    pub fn logout(&self) {
        let mut st = self.state.write();
        let outgoing = st.subject.take().map(|s| s.id);
        st.resolving = false;
        self.storage.remove(IDENTITY_KEY);
        if let Some(id) = outgoing {
            self.cache.invalidate(&id);
            debug!(target: "caregate::session", "logout subject={}", id);
        }
    }

    pub fn snapshot(&self) -> SessionState { self.state.read().clone() }
}
