//! Identifiers and timestamps.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// An identifier used by bots, contacts, messages and events.
///
/// Components keep whichever representation is natural for them. Comparison
/// between variants goes through the literal, so `Id::Long(1)` equals
/// `Id::Text("1")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// A 64-bit numeric id.
    Long(i64),
    /// A 32-bit numeric id.
    Int(i32),
    /// A textual id.
    Text(String),
}

impl Id {
    /// Creates a random textual id.
    pub fn random() -> Self {
        Self::Text(uuid::Uuid::new_v4().to_string())
    }

    /// Tries to interpret this id as an `i64`.
    pub fn to_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Tries to interpret this id as an `i32`.
    pub fn to_int(&self) -> Option<i32> {
        match self {
            Self::Long(v) => i32::try_from(*v).ok(),
            Self::Int(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Returns the literal form of this id.
    pub fn literal(&self) -> String {
        self.to_string()
    }

    /// Returns true if the literal is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (a, b) => match (a.to_long(), b.to_long()) {
                (Some(x), Some(y)) => x == y,
                _ => a.literal() == b.literal(),
            },
        }
    }
}

impl Eq for Id {}

impl std::hash::Hash for Id {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self.to_long() {
            Some(v) => v.hash(state),
            None => self.literal().hash(state),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A point in time, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Creates a timestamp from epoch milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Creates a timestamp from epoch seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds.saturating_mul(1000))
    }

    /// Epoch milliseconds.
    pub fn millis(&self) -> i64 {
        self.0
    }

    /// Epoch seconds.
    pub fn seconds(&self) -> i64 {
        self.0 / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_equality_across_variants() {
        assert_eq!(Id::Long(10001), Id::from("10001"));
        assert_eq!(Id::Int(7), Id::Long(7));
        assert_ne!(Id::from("abc"), Id::Long(0));

        let mut set = HashSet::new();
        set.insert(Id::Long(42));
        assert!(set.contains(&Id::from("42")));
    }

    #[test]
    fn test_id_conversions() {
        assert_eq!(Id::from(" 123 ").to_long(), Some(123));
        assert_eq!(Id::Long(i64::MAX).to_int(), None);
        assert!(Id::from("").is_empty());
        assert!(!Id::random().is_empty());
    }

    #[test]
    fn test_timestamp_seconds() {
        let ts = Timestamp::from_seconds(1_650_000_000);
        assert_eq!(ts.millis(), 1_650_000_000_000);
        assert_eq!(ts.seconds(), 1_650_000_000);
        assert!(Timestamp::now().millis() > 0);
    }
}
