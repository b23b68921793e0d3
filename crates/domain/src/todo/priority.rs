//! Priority levels for todo items.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// How urgent a todo item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum PriorityLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl PriorityLevel {
    /// Returns the stored name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::None => "None",
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PriorityLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PriorityLevel::None),
            "low" => Ok(PriorityLevel::Low),
            "medium" => Ok(PriorityLevel::Medium),
            "high" => Ok(PriorityLevel::High),
            _ => Err(DomainError::UnsupportedPriority(s.to_string())),
        }
    }
}
