//! Account role

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::AccountValidationError;

/// Job role attached to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ProductManager,
    Admin,
    #[default]
    SoftwareEngineer,
    SoftwareArchitect,
    DataEngineer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::ProductManager,
        Role::Admin,
        Role::SoftwareEngineer,
        Role::SoftwareArchitect,
        Role::DataEngineer,
    ];

    /// Stored/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductManager => "product_manager",
            Self::Admin => "admin",
            Self::SoftwareEngineer => "software_engineer",
            Self::SoftwareArchitect => "software_architect",
            Self::DataEngineer => "data_engineer",
        }
    }

    /// Human readable label for admin listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductManager => "Product Manager",
            Self::Admin => "Admin",
            Self::SoftwareEngineer => "Software Engineer",
            Self::SoftwareArchitect => "Software Architect",
            Self::DataEngineer => "Data Engineer",
        }
    }
}

impl FromStr for Role {
    type Err = AccountValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AccountValidationError::InvalidRole(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
