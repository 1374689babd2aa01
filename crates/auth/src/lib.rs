//! `construcard-auth` — client-side session and authorization core.
//!
//! Holds the authorization decision for the dashboard UI. A trusted backend
//! still enforces the same permissions; nothing here replaces that.

pub mod credentials;
pub mod explain;
pub mod guard;
pub mod identity;
pub mod permissions;
pub mod record;
pub mod registry;
pub mod roles;
pub mod session;
pub mod store;

pub use credentials::{CredentialError, CredentialStore, MockCredentialStore, DEMO_PASSWORD};
pub use explain::{explain, AuthorizationExplanation};
pub use guard::{evaluate, AccessRequest, Denial, Guard, Notice, Outcome, Rendered};
pub use identity::Identity;
pub use permissions::{default_role_permissions, Permission, PermissionModel, PermissionSet};
pub use record::{RecordError, SessionRecord};
pub use registry::RbacRegistry;
pub use roles::Role;
pub use session::{SessionConfig, SessionManager, DEFAULT_STORAGE_KEY};
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore, StoreError};
