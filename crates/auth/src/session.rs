//! Session manager: owns the current identity and its persisted record.
//!
//! Lifecycle: construct, [`SessionManager::restore`] once at startup, then any
//! number of [`SessionManager::login`] / [`SessionManager::logout`] calls.
//! Until `restore` has run every query sees "no identity".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::credentials::{CredentialStore, MockCredentialStore};
use crate::guard::{evaluate, AccessRequest, Outcome};
use crate::record::SessionRecord;
use crate::store::{InMemorySessionStore, SessionStore};
use crate::{Identity, PermissionModel, Role};

/// Storage slot holding the persisted session.
pub const DEFAULT_STORAGE_KEY: &str = "construcard_user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub storage_key: String,
    /// When set, persisted records expire this long after login.
    pub session_ttl: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            session_ttl: None,
        }
    }
}

pub struct SessionManager {
    config: SessionConfig,
    model: Arc<PermissionModel>,
    credentials: Arc<dyn CredentialStore>,
    store: Arc<dyn SessionStore>,
    current: watch::Sender<Option<Identity>>,
    loading: watch::Sender<bool>,
    // Operations in flight; `loading` is only written while this is held.
    // Starts at 1: the pending restore counts as in flight.
    in_flight: Mutex<usize>,
    restored: AtomicBool,
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("current", &*self.current.borrow())
            .field("loading", &*self.loading.borrow())
            .field("restored", &self.restored.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// Marks one operation as in flight for as long as it lives.
struct LoadingGuard<'a> {
    manager: &'a SessionManager,
}

impl<'a> LoadingGuard<'a> {
    fn begin(manager: &'a SessionManager) -> Self {
        let mut in_flight = manager.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight += 1;
        manager.loading.send_replace(true);
        drop(in_flight);
        Self { manager }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.manager.finish_operation();
    }
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        credentials: Arc<dyn CredentialStore>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let (current, _) = watch::channel(None);
        let (loading, _) = watch::channel(true);
        Self {
            config,
            model: PermissionModel::standard(),
            credentials,
            store,
            current,
            loading,
            in_flight: Mutex::new(1),
            restored: AtomicBool::new(false),
        }
    }

    /// Demo credentials, in-memory persistence, default config.
    pub fn in_memory() -> Self {
        Self::new(
            SessionConfig::default(),
            Arc::new(MockCredentialStore::demo()),
            Arc::new(InMemorySessionStore::new()),
        )
    }

    pub fn with_permission_model(mut self, model: Arc<PermissionModel>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn permission_model(&self) -> &PermissionModel {
        &self.model
    }

    /// Load the persisted session, if any.
    ///
    /// Runs once; later calls are ignored. A record that is unreadable,
    /// malformed, carries an unknown role or has expired is removed and the
    /// session starts logged out. Nothing here is reported to the caller.
    pub fn restore(&self) {
        if self.restored.swap(true, Ordering::AcqRel) {
            tracing::debug!("session restore already ran; ignoring");
            return;
        }

        let key = self.config.storage_key.as_str();
        match self.store.load(key) {
            Ok(None) => {
                tracing::debug!(storage_key = key, "no persisted session");
            }
            Ok(Some(raw)) => match SessionRecord::decode_valid_at(&raw, Utc::now()) {
                Ok(record) => {
                    tracing::info!(
                        user_id = %record.user.id,
                        role = %record.user.role,
                        session_id = %record.session_id,
                        record_version = record.version,
                        "session restored"
                    );
                    self.current.send_replace(Some(record.user));
                }
                Err(err) => {
                    tracing::warn!(storage_key = key, error = %err, "discarding persisted session");
                    if let Err(err) = self.store.clear(key) {
                        tracing::warn!(storage_key = key, error = %err, "failed to clear persisted session");
                    }
                }
            },
            Err(err) => {
                tracing::warn!(storage_key = key, error = %err, "failed to read persisted session; starting logged out");
            }
        }

        self.finish_operation();
    }

    /// Verify credentials and, on success, make the account current.
    ///
    /// Returns `false` for an unknown email or a wrong password, leaving any
    /// existing session in place. Overlapping calls are allowed; the last one
    /// to complete successfully wins.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let _busy = LoadingGuard::begin(self);

        let verified = match self.credentials.verify(email, password).await {
            Ok(verified) => verified,
            Err(err) => {
                tracing::warn!(email, error = %err, "credential verification failed");
                None
            }
        };

        let Some(identity) = verified else {
            tracing::info!(email, "login rejected");
            return false;
        };

        self.persist(&identity);
        tracing::info!(user_id = %identity.id, role = %identity.role, "login succeeded");
        self.current.send_replace(Some(identity));
        true
    }

    /// Drop the current identity and its record. Idempotent.
    pub fn logout(&self) {
        let previous = self.current.send_replace(None);
        if let Err(err) = self.store.clear(&self.config.storage_key) {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        match previous {
            Some(identity) => tracing::info!(user_id = %identity.id, "logged out"),
            None => tracing::debug!("logout without an active session"),
        }
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.current.borrow().as_ref().map(|i| i.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// `false` without an identity; otherwise the role's permission check.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|i| self.model.role_has_permission(i.role, permission))
    }

    /// Evaluate an access request against the current identity.
    pub fn evaluate(&self, request: &AccessRequest) -> Outcome {
        evaluate(self.current.borrow().as_ref(), request, &self.model)
    }

    /// True while restore is pending or any login is in flight.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn is_restored(&self) -> bool {
        self.restored.load(Ordering::Acquire)
    }

    /// Watch identity changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// Watch the loading flag.
    pub fn loading_changes(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    fn finish_operation(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.loading.send_replace(false);
        }
    }

    // A failed write keeps the in-process session; only the next restart loses it.
    fn persist(&self, identity: &Identity) {
        let ttl = self.config.session_ttl.and_then(|ttl| match chrono::Duration::from_std(ttl) {
            Ok(ttl) => Some(ttl),
            Err(err) => {
                tracing::warn!(ttl_secs = ttl.as_secs(), error = %err, "session ttl out of range; storing record without expiry");
                None
            }
        });
        let record = SessionRecord::new(identity.clone(), Utc::now(), ttl);

        let encoded = match record.encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode session record");
                return;
            }
        };

        if let Err(err) = self.store.save(&self.config.storage_key, &encoded) {
            tracing::warn!(user_id = %identity.id, error = %err, "failed to persist session");
        }
    }
}
