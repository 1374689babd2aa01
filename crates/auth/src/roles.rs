use core::str::FromStr;

use serde::{Deserialize, Serialize};

use construcard_core::DomainError;

/// Job function of a dashboard user.
///
/// The set is closed: every role has exactly one entry in the permission
/// model, so a role string that does not parse here must never reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Engineer,
    Supervisor,
    Supplier,
}

impl Role {
    pub const COUNT: usize = 4;

    pub const ALL: [Role; Role::COUNT] = [Role::Admin, Role::Engineer, Role::Supervisor, Role::Supplier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Engineer => "engineer",
            Role::Supervisor => "supervisor",
            Role::Supplier => "supplier",
        }
    }

    /// Human-readable name shown next to the user in the header.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Engineer => "Engineer",
            Role::Supervisor => "Supervisor",
            Role::Supplier => "Supplier",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full access to the system",
            Role::Engineer => "Geodesy, PTO, reports",
            Role::Supervisor => "Construction works, work control",
            Role::Supplier => "Warehouse, purchasing",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Role::Admin => 0,
            Role::Engineer => 1,
            Role::Supervisor => 2,
            Role::Supplier => 3,
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role '{s}'")))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
