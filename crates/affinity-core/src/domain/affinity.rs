use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical affinity identifier.
///
/// Every id is stored with the `aff` prefix; bare ids such as `"12"` are
/// normalized to `"aff12"` on construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AffinityId(String);

impl AffinityId {
    pub const PREFIX: &'static str = "aff";

    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with(Self::PREFIX) {
            Self(raw)
        } else {
            Self(format!("{}{}", Self::PREFIX, raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AffinityId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for AffinityId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<AffinityId> for String {
    fn from(id: AffinityId) -> Self {
        id.0
    }
}

impl fmt::Display for AffinityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, scored attribute tag applied to properties and destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affinity {
    pub id: AffinityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub score_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub applicable_entities: Vec<String>,
    #[serde(default)]
    pub score_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    /// Percentage of tagged properties carrying a score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_date: Option<DateTime<Utc>>,
}

impl Affinity {
    pub fn new(id: impl Into<AffinityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            definition: None,
            score_type: None,
            category: None,
            status: None,
            applicable_entities: Vec::new(),
            score_available: false,
            average_score: None,
            coverage: None,
            last_updated_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefix_normalization() {
        assert_eq!(AffinityId::new("12").as_str(), "aff12");
        assert_eq!(AffinityId::new("affB").as_str(), "affB");
    }

    #[test]
    fn test_id_normalized_on_deserialize() {
        let affinity: Affinity =
            serde_json::from_str(r#"{"id":"7","name":"Luxury","type":"Platform Score"}"#).unwrap();
        assert_eq!(affinity.id.as_str(), "aff7");
        assert_eq!(affinity.score_type.as_deref(), Some("Platform Score"));
        assert!(affinity.applicable_entities.is_empty());
    }
}
