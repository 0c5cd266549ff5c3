//! Recently viewed list rules: dedupe by id, most recent first, bounded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::affinity::{Affinity, AffinityId};

/// Maximum number of entries kept in any recently viewed list.
pub const MAX_RECENTLY_VIEWED: usize = 10;

/// A viewed item snapshot. Only `id` is interpreted; every other field is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentlyViewedEntry {
    pub id: AffinityId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RecentlyViewedEntry {
    pub fn new(id: impl Into<AffinityId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Snapshot of an affinity as shown in the recently viewed panel.
    pub fn from_affinity(affinity: &Affinity, viewed_at: DateTime<Utc>) -> Self {
        let mut entry = Self::new(affinity.id.clone())
            .with_field("name", affinity.name.clone())
            .with_field("lastViewed", viewed_at.to_rfc3339());
        if let Some(category) = &affinity.category {
            entry = entry.with_field("category", category.clone());
        }
        entry
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

/// Move `entry` to the front of `list`, dropping any older copy and
/// truncating to [`MAX_RECENTLY_VIEWED`].
pub fn record_view(list: &mut Vec<RecentlyViewedEntry>, entry: RecentlyViewedEntry) {
    list.retain(|existing| existing.id != entry.id);
    list.insert(0, entry);
    list.truncate(MAX_RECENTLY_VIEWED);
}

/// Union of a not-yet-synced local list with the stored remote list.
///
/// Local entries come first because they were viewed after the last sync.
/// An id present on both sides takes the position of its first occurrence,
/// keeps the remote payload, and borrows any field only the local copy has.
pub fn merge_lists(
    local: Vec<RecentlyViewedEntry>,
    remote: Vec<RecentlyViewedEntry>,
) -> Vec<RecentlyViewedEntry> {
    let mut merged: Vec<RecentlyViewedEntry> = Vec::with_capacity(local.len() + remote.len());

    for entry in local {
        if !merged.iter().any(|e| e.id == entry.id) {
            merged.push(entry);
        }
    }

    for entry in remote {
        match merged.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => {
                let local_fields = std::mem::replace(&mut existing.fields, entry.fields);
                for (key, value) in local_fields {
                    existing.fields.entry(key).or_insert(value);
                }
            }
            None => merged.push(entry),
        }
    }

    merged.truncate(MAX_RECENTLY_VIEWED);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(list: &[RecentlyViewedEntry]) -> Vec<&str> {
        list.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_record_view_dedupes_and_moves_to_front() {
        let mut list = Vec::new();
        for id in ["1", "2", "3", "2"] {
            record_view(&mut list, RecentlyViewedEntry::new(id));
        }
        assert_eq!(ids(&list), vec!["aff2", "aff3", "aff1"]);
    }

    #[test]
    fn test_record_view_caps_at_ten() {
        let mut list = Vec::new();
        for n in 1..=11 {
            record_view(&mut list, RecentlyViewedEntry::new(n.to_string()));
        }
        assert_eq!(list.len(), MAX_RECENTLY_VIEWED);
        assert_eq!(list[0].id.as_str(), "aff11");
        assert!(!list.iter().any(|e| e.id.as_str() == "aff1"));
    }

    #[test]
    fn test_readding_after_overflow() {
        let mut list = Vec::new();
        for n in 1..=10 {
            record_view(&mut list, RecentlyViewedEntry::new(n.to_string()));
        }
        record_view(&mut list, RecentlyViewedEntry::new("11"));
        record_view(&mut list, RecentlyViewedEntry::new("2"));

        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id.as_str(), "aff2");
        assert_eq!(list[1].id.as_str(), "aff11");
        assert!(!list.iter().any(|e| e.id.as_str() == "aff1"));
    }

    #[test]
    fn test_merge_local_first_deduplicated() {
        let local = vec![RecentlyViewedEntry::new("affA"), RecentlyViewedEntry::new("affB")];
        let remote = vec![RecentlyViewedEntry::new("affB"), RecentlyViewedEntry::new("affC")];

        let merged = merge_lists(local, remote);
        assert_eq!(ids(&merged), vec!["affA", "affB", "affC"]);
    }

    #[test]
    fn test_merge_remote_payload_wins_local_fills_gaps() {
        let local = vec![RecentlyViewedEntry::new("affB")
            .with_field("name", "Local name")
            .with_field("lastViewed", "2024-03-20T10:00:00Z")];
        let remote = vec![RecentlyViewedEntry::new("affB").with_field("name", "Remote name")];

        let merged = merge_lists(local, remote);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name(), Some("Remote name"));
        assert_eq!(merged[0].fields["lastViewed"], "2024-03-20T10:00:00Z");
    }

    #[test]
    fn test_merge_caps_at_ten() {
        let local: Vec<_> = (0..6).map(|n| RecentlyViewedEntry::new(format!("L{n}"))).collect();
        let remote: Vec<_> = (0..6).map(|n| RecentlyViewedEntry::new(format!("R{n}"))).collect();

        let merged = merge_lists(local, remote);
        assert_eq!(merged.len(), MAX_RECENTLY_VIEWED);
        assert_eq!(merged[0].id.as_str(), "affL0");
        assert_eq!(merged[9].id.as_str(), "affR3");
    }

    #[test]
    fn test_entry_wire_shape_is_flat() {
        let entry = RecentlyViewedEntry::new("5").with_field("name", "Wellness");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "aff5", "name": "Wellness" }));
    }
}
