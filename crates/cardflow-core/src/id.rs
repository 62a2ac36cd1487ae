//! Opaque identifiers for boards, columns and cards.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A string-backed identifier.
///
/// Ids compare by value. Fresh ids are random UUIDs, so they are never
/// reused across boards, columns or cards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

/// Identifier of a board.
pub type BoardId = Id;
/// Identifier of a column.
pub type ColumnId = Id;
/// Identifier of a card.
pub type CardId = Id;

impl Id {
    /// Generate a fresh, unique identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = Id::new();
        let b = Id::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_by_value() {
        assert_eq!(Id::from("card-1"), Id::from("card-1".to_string()));
        assert_eq!(Id::from("col-1").to_string(), "col-1");
    }

    #[test]
    fn test_serde_transparent() {
        let id = Id::from("col-2");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"col-2\"");
        let back: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
