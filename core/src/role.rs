//! Platform roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role stored on a user's profile row.
///
/// Unknown or missing values are treated as [`Role::Student`], the least
/// privileged role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular learner/customer
    #[default]
    Student,
    /// Course author, allowed to upload videos
    Professor,
    /// Platform administrator
    Admin,
}

impl Role {
    /// Parse a role from its database representation (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "professor" => Self::Professor,
            "admin" => Self::Admin,
            _ => Self::Student,
        }
    }

    /// Database/string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professor => "professor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
