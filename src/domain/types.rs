//! Shared domain value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a provisioned team.
///
/// The string form is part of the cache-key format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamStatus {
    Active,
    Archived,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Archived => "Archived",
        }
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_form_is_stable() {
        assert_eq!(TeamStatus::Active.as_str(), "Active");
        assert_eq!(TeamStatus::Archived.as_str(), "Archived");
        assert_eq!(TeamStatus::Archived.to_string(), "Archived");
    }
}
