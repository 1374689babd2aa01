//! Access guard: decides whether a protected region may be shown.
//!
//! [`evaluate`] is the pure decision. [`Guard`] wraps it for view composition:
//! it renders the protected content, a caller fallback, or one of two
//! built-in notices.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{Identity, Permission, PermissionModel, Role, SessionManager};

/// Constraints on one protected region.
///
/// Empty `allowed_roles` means no role restriction; empty
/// `required_permissions` means no permission restriction. With both empty
/// any authenticated identity passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequest {
    allowed_roles: BTreeSet<Role>,
    required_permissions: Vec<Permission>,
}

impl AccessRequest {
    /// Any authenticated identity.
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles.extend(roles);
        self
    }

    pub fn permissions<P: Into<Permission>>(mut self, permissions: impl IntoIterator<Item = P>) -> Self {
        for p in permissions {
            let p = p.into();
            if !self.required_permissions.contains(&p) {
                self.required_permissions.push(p);
            }
        }
        self
    }

    pub fn allowed_roles(&self) -> &BTreeSet<Role> {
        &self.allowed_roles
    }

    pub fn required_permissions(&self) -> &[Permission] {
        &self.required_permissions
    }
}

/// What an access check failed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Denial {
    /// The identity's role is not among these.
    Role { allowed: Vec<Role> },
    /// The identity holds none of these.
    Permission { any_of: Vec<Permission> },
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Denial::Role { allowed } => {
                let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
                write!(f, "requires role: {}", names.join(", "))
            }
            Denial::Permission { any_of } => {
                let names: Vec<&str> = any_of.iter().map(|p| p.as_str()).collect();
                write!(f, "requires one of the permissions: {}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    DenyUnauthenticated,
    DenyForbidden(Denial),
}

impl Outcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allow)
    }
}

/// Decide access for `identity` against `request`.
///
/// Checks run in order: authentication, role membership, then permissions.
/// Holding any one of the required permissions is enough.
pub fn evaluate(identity: Option<&Identity>, request: &AccessRequest, model: &PermissionModel) -> Outcome {
    let Some(identity) = identity else {
        return Outcome::DenyUnauthenticated;
    };

    if !request.allowed_roles.is_empty() && !request.allowed_roles.contains(&identity.role) {
        return Outcome::DenyForbidden(Denial::Role {
            allowed: request.allowed_roles.iter().copied().collect(),
        });
    }

    if !request.required_permissions.is_empty()
        && !request
            .required_permissions
            .iter()
            .any(|p| model.role_has_permission(identity.role, p.as_str()))
    {
        return Outcome::DenyForbidden(Denial::Permission {
            any_of: request.required_permissions.clone(),
        });
    }

    Outcome::Allow
}

/// Built-in notice rendered when no fallback was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AuthenticationRequired,
    InsufficientRights(Denial),
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Notice::AuthenticationRequired => f.write_str("Authentication is required to access this section"),
            Notice::InsufficientRights(denial @ Denial::Role { .. }) => {
                write!(f, "You do not have access to this section ({denial})")
            }
            Notice::InsufficientRights(denial) => {
                write!(f, "You do not have the permissions required for this section ({denial})")
            }
        }
    }
}

/// Result of rendering a guarded region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<V> {
    Content(V),
    Fallback(V),
    Notice(Notice),
}

impl<V> Rendered<V> {
    /// The rendered view, if it was content or a fallback.
    pub fn into_view(self) -> Option<V> {
        match self {
            Rendered::Content(v) | Rendered::Fallback(v) => Some(v),
            Rendered::Notice(_) => None,
        }
    }
}

/// View-composition wrapper around [`evaluate`] bound to a session.
#[derive(Debug)]
pub struct Guard<'s> {
    session: &'s SessionManager,
    request: AccessRequest,
}

impl<'s> Guard<'s> {
    pub fn new(session: &'s SessionManager, request: AccessRequest) -> Self {
        Self { session, request }
    }

    pub fn outcome(&self) -> Outcome {
        self.session.evaluate(&self.request)
    }

    /// Render `content` when allowed, otherwise a built-in notice.
    pub fn render<V>(&self, content: impl FnOnce() -> V) -> Rendered<V> {
        match self.outcome() {
            Outcome::Allow => Rendered::Content(content()),
            Outcome::DenyUnauthenticated => Rendered::Notice(Notice::AuthenticationRequired),
            Outcome::DenyForbidden(denial) => {
                tracing::debug!(%denial, "guarded region denied");
                Rendered::Notice(Notice::InsufficientRights(denial))
            }
        }
    }

    /// Render `content` when allowed, otherwise `fallback` for any denial.
    pub fn render_or<V>(&self, content: impl FnOnce() -> V, fallback: impl FnOnce() -> V) -> Rendered<V> {
        match self.outcome() {
            Outcome::Allow => Rendered::Content(content()),
            _ => Rendered::Fallback(fallback()),
        }
    }
}
