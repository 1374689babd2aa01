use std::borrow::{Borrow, Cow};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are opaque, case-sensitive strings (e.g. "view_pto").
/// The single value `"*"` is the wildcard: a role holding it satisfies every
/// permission query. There are no partial wildcards; `"view_*"` is just a
/// literal name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Self::WILDCARD
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of permissions granted to one role. Order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self(permissions.into_iter().map(Into::into).collect())
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.contains(&Permission::WILDCARD)
    }

    /// Wildcard or exact-name match.
    pub fn grants(&self, permission: &str) -> bool {
        self.has_wildcard() || self.0.contains(permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Permissions granted to each role by default.
pub fn default_role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => &["*"],
        Role::Engineer => &["view_projects", "create_reports", "manage_geodesy", "view_pto"],
        Role::Supervisor => &["view_projects", "manage_construction", "approve_works", "manage_workers"],
        Role::Supplier => &["view_inventory", "manage_supplies", "create_orders", "view_warehouse"],
    }
}

static STANDARD: LazyLock<Arc<PermissionModel>> =
    LazyLock::new(|| Arc::new(PermissionModel::from_role_mapping(|role| PermissionSet::new(default_role_permissions(role).iter().copied()))));

/// Role → permission mapping.
///
/// Built once for every role in [`Role::ALL`], so a lookup can never miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionModel {
    sets: [PermissionSet; Role::COUNT],
}

impl PermissionModel {
    pub fn from_role_mapping<F>(role_permissions: F) -> Self
    where
        F: Fn(Role) -> PermissionSet,
    {
        Self {
            sets: Role::ALL.map(role_permissions),
        }
    }

    /// The process-wide mapping from [`default_role_permissions`].
    pub fn standard() -> Arc<PermissionModel> {
        Arc::clone(&STANDARD)
    }

    pub fn permissions_for(&self, role: Role) -> &PermissionSet {
        &self.sets[role.index()]
    }

    pub fn role_has_permission(&self, role: Role, permission: &str) -> bool {
        self.permissions_for(role).grants(permission)
    }

    /// Roles whose set would satisfy `permission`.
    pub fn roles_granting(&self, permission: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.role_has_permission(*r, permission))
            .collect()
    }
}

impl Default for PermissionModel {
    fn default() -> Self {
        PermissionModel::standard().as_ref().clone()
    }
}
