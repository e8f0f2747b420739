//! Blue/green role naming

use crate::error::{DeployError, Result};

/// One of the two fixed slots a deployment alternates between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Blue,
    Green,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Blue, Role::Green];

    /// Identifier suffix, including the separator
    pub fn suffix(self) -> &'static str {
        match self {
            Role::Blue => "-blue",
            Role::Green => "-green",
        }
    }

    /// The opposite role
    pub fn other(self) -> Role {
        match self {
            Role::Blue => Role::Green,
            Role::Green => Role::Blue,
        }
    }

    /// Instance identifier for this role under `base`
    pub fn identifier(self, base: &str) -> String {
        format!("{}{}", base, self.suffix())
    }

    /// Split an instance identifier into its base and role
    pub fn parse_identifier(identifier: &str) -> Result<(&str, Role)> {
        Role::ALL
            .into_iter()
            .find_map(|role| {
                identifier
                    .strip_suffix(role.suffix())
                    .filter(|base| !base.is_empty())
                    .map(|base| (base, role))
            })
            .ok_or_else(|| {
                DeployError::Validation(format!(
                    "instance identifier '{}' does not end with -blue or -green",
                    identifier
                ))
            })
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Blue => write!(f, "blue"),
            Role::Green => write!(f, "green"),
        }
    }
}
