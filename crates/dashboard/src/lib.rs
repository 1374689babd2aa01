//! `construcard-dashboard` — command-line shell around the session core.
//!
//! Wires configuration, the file-backed session store and the demo
//! credential backend into one [`SessionManager`](construcard_auth::SessionManager).

pub mod commands;
pub mod config;
pub mod navigation;

use std::sync::Arc;

use construcard_auth::{FileSessionStore, MockCredentialStore, SessionManager};

pub use commands::{run, Command};
pub use config::DashboardConfig;

/// Build a session manager from configuration. Does not restore.
pub fn build_session(config: &DashboardConfig) -> SessionManager {
    let credentials = MockCredentialStore::demo().with_latency(config.login_latency);
    let store = FileSessionStore::new(&config.session_dir);
    SessionManager::new(config.session_config(), Arc::new(credentials), Arc::new(store))
}
