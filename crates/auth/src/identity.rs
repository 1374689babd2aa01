//! The authenticated user.

use serde::{Deserialize, Serialize};

use construcard_core::{DomainResult, Email, UserId};

use crate::Role;

/// A user established by credential verification.
///
/// An `Identity` always carries a [`Role`] from the closed set; there is no way
/// to build one around an unrecognized role string. Deserializing a record with
/// an unknown role fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Identity {
    pub fn new(id: UserId, email: Email, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email,
            name: name.into(),
            role,
            avatar: None,
            department: None,
            phone: None,
        }
    }

    /// Build from untyped parts, rejecting unknown roles and malformed ids.
    pub fn from_parts(id: &str, email: &str, name: &str, role: &str) -> DomainResult<Self> {
        Ok(Self::new(id.parse()?, email.parse()?, name, role.parse()?))
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}
