//! Actor model used for attribution and authorization

use serde::{Deserialize, Serialize};

/// Role of the person performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary reporter
    #[default]
    Citizen,
    /// Triage/assignment privileges, may override any status
    Manager,
}

/// Who is performing a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable display name, also recorded in status history
    pub name: String,
    pub role: Role,
}

impl Actor {
    /// Create a citizen actor
    #[must_use]
    pub fn citizen(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Citizen,
        }
    }

    /// Create a manager actor
    #[must_use]
    pub fn manager(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Manager,
        }
    }

    /// Whether this actor carries manager privileges
    #[must_use]
    pub const fn is_manager(&self) -> bool {
        matches!(self.role, Role::Manager)
    }
}
