//! Identifier and configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied document identifier, unique among currently-held entries.
///
/// Mirrors GeoJSON feature ids: either a number or a string. The index never
/// interprets identifiers beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Int(i64),
    Text(String),
}

impl From<i64> for DocId {
    fn from(id: i64) -> Self {
        DocId::Int(id)
    }
}

impl From<i32> for DocId {
    fn from(id: i32) -> Self {
        DocId::Int(id.into())
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        DocId::Text(id.to_string())
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        DocId::Text(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Int(n) => write!(f, "{}", n),
            DocId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Database configuration.
///
/// Fanout bounds are fixed at construction time, not tunable per call.
///
/// # Example
///
/// ```rust
/// use geodex::Config;
///
/// let config = Config::default();
/// assert_eq!(config.max_node_entries, 9);
/// assert_eq!(config.min_node_entries(), 4);
///
/// let config: Config = serde_json::from_str(r#"{"max_node_entries": 16}"#).unwrap();
/// assert_eq!(config.min_node_entries(), 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of entries or children per tree node (default: 9).
    #[serde(default = "Config::default_max_node_entries")]
    pub max_node_entries: usize,
}

impl Config {
    const fn default_max_node_entries() -> usize {
        9
    }

    pub fn with_max_node_entries(max_node_entries: usize) -> Self {
        assert!(
            max_node_entries >= 4,
            "Maximum node fanout must be at least 4"
        );

        Self { max_node_entries }
    }

    /// Minimum fill of a non-root node: `ceil(0.4 × M)`.
    pub fn min_node_entries(&self) -> usize {
        (self.max_node_entries * 2).div_ceil(5)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_node_entries: Self::default_max_node_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_conversions() {
        assert_eq!(DocId::from(7), DocId::Int(7));
        assert_eq!(DocId::from("WA"), DocId::Text("WA".to_string()));
        assert_eq!(DocId::from("WA").to_string(), "WA");
        assert_eq!(DocId::from(7).to_string(), "7");
    }

    #[test]
    fn test_doc_id_serde_untagged() {
        let id: DocId = serde_json::from_str("42").unwrap();
        assert_eq!(id, DocId::Int(42));

        let id: DocId = serde_json::from_str("\"Washington\"").unwrap();
        assert_eq!(id, DocId::Text("Washington".to_string()));
    }

    #[test]
    fn test_min_node_entries_derivation() {
        assert_eq!(Config::default().min_node_entries(), 4);
        assert_eq!(Config::with_max_node_entries(4).min_node_entries(), 2);
        assert_eq!(Config::with_max_node_entries(10).min_node_entries(), 4);
        assert_eq!(Config::with_max_node_entries(25).min_node_entries(), 10);
    }

    #[test]
    #[should_panic(expected = "at least 4")]
    fn test_fanout_lower_bound_rejected() {
        Config::with_max_node_entries(3);
    }
}
