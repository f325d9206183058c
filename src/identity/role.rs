use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Canonical role set. Closed: adding a role is a compile-checked change everywhere it is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Coordinator,
    Secretary,
    Director,
    Developer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Teacher,
        Role::Coordinator,
        Role::Secretary,
        Role::Director,
        Role::Developer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Coordinator => "coordinator",
            Role::Secretary => "secretary",
            Role::Director => "director",
            Role::Developer => "developer",
        }
    }

    /// Prefix of account ids issued for this role.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Role::Student => "STU",
            Role::Teacher => "TEA",
            Role::Coordinator => "COO",
            Role::Secretary => "SEC",
            Role::Director => "DIR",
            Role::Developer => "DEV",
        }
    }

    /// Login form copy for this user type.
    pub fn login_form(&self) -> LoginFormInfo {
        let (title, description, identifier_label) = match self {
            Role::Student => ("Student access", "Sign in with your enrollment number, password and school unit", "Enrollment number (RM)"),
            Role::Teacher => ("Teacher access", "Sign in with your identifier and password", "Teacher identifier"),
            Role::Coordinator => ("Coordination access", "Pedagogical coordination panel", "Coordinator identifier"),
            Role::Secretary => ("Secretary access", "Administrative office panel", "Secretary identifier"),
            Role::Director => ("Director access", "Executive board panel", "Director identifier"),
            Role::Developer => ("Developer access", "Development and system panel", "Developer identifier"),
        };
        LoginFormInfo { title, description, identifier_label }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase();
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == t)
            .ok_or_else(|| AppError::UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginFormInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub identifier_label: &'static str,
}
