//! Read-only view of the RBAC model for audit and display.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{PermissionModel, Role};

/// Role definition with its granted permissions.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub role: Role,
    pub label: &'static str,
    pub description: &'static str,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: String,
    /// Roles holding this permission explicitly (wildcard holders excluded).
    pub granted_to: Vec<Role>,
}

/// Every role and every distinct permission name in a [`PermissionModel`].
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: Vec<RoleDefinition>,
    pub permissions: Vec<PermissionDefinition>,
}

impl RbacRegistry {
    pub fn from_model(model: &PermissionModel) -> Self {
        let mut permissions: BTreeMap<String, Vec<Role>> = BTreeMap::new();

        let roles = Role::ALL
            .into_iter()
            .map(|role| {
                let set = model.permissions_for(role);
                for perm in set.iter().filter(|p| !p.is_wildcard()) {
                    permissions.entry(perm.as_str().to_string()).or_default().push(role);
                }
                RoleDefinition {
                    role,
                    label: role.label(),
                    description: role.description(),
                    permissions: set.iter().map(|p| p.as_str().to_string()).collect(),
                }
            })
            .collect();

        Self {
            roles,
            permissions: permissions
                .into_iter()
                .map(|(name, granted_to)| PermissionDefinition { name, granted_to })
                .collect(),
        }
    }

    pub fn role(&self, role: Role) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.role == role)
    }
}
