//! Item grouping.
//!
//! Partitions items into ordered buckets, either by a field's declared
//! catalog or by observed values when no catalog exists. Every item lands
//! in exactly one bucket; unmatched items collect in a trailing
//! "Unassigned" bucket that is appended only when non-empty.

use std::collections::HashMap;

use crate::field::{CatalogEntry, FieldDefinition};
use crate::item::Item;
use crate::value::{resolve_value, CanonicalValue};

pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Bucket keys longer than this are truncated for grouping purposes so a
/// long text value cannot corrupt the group header.
const MAX_KEY_CHARS: usize = 120;

/// Header of one group bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLabel {
    pub id: Option<String>,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupBucket {
    pub label: BucketLabel,
    pub unassigned: bool,
    /// Indices into the item slice the group was computed from.
    pub item_indices: Vec<usize>,
}

impl GroupBucket {
    fn named(label: BucketLabel) -> Self {
        Self {
            label,
            unassigned: false,
            item_indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_indices.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupedItems {
    pub buckets: Vec<GroupBucket>,
}

impl GroupedItems {
    pub fn total_items(&self) -> usize {
        self.buckets.iter().map(|b| b.item_indices.len()).sum()
    }

    /// Drop empty buckets. The engine returns empty catalog buckets so
    /// callers that want them (board columns) still have them; callers
    /// that don't use this.
    pub fn without_empty_buckets(mut self) -> Self {
        self.buckets.retain(|b| !b.is_empty());
        self
    }
}

/// Partition `items` into ordered buckets for `field`.
///
/// Catalogs carry authorial intent about order and identity, so a declared
/// catalog always wins over observed values.
pub fn group_items(items: &[Item], field: &FieldDefinition) -> GroupedItems {
    match field.catalog() {
        Some(catalog) => group_by_catalog(items, field, &catalog),
        None => group_by_observed(items, field),
    }
}

/// Catalog mode: one bucket per catalog entry, in catalog order, created
/// before any item is scanned. Items match a bucket by id first, then by
/// name/title — both case-sensitive.
fn group_by_catalog(
    items: &[Item],
    field: &FieldDefinition,
    catalog: &[CatalogEntry<'_>],
) -> GroupedItems {
    let mut buckets: Vec<GroupBucket> = catalog
        .iter()
        .map(|entry| {
            GroupBucket::named(BucketLabel {
                id: entry.id.map(str::to_string),
                name: entry.name.to_string(),
                color: entry.color.map(str::to_string),
            })
        })
        .collect();
    let mut unassigned: Vec<usize> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let value = resolve_value(item, field);
        let (id, name) = match &value {
            CanonicalValue::Choice(c) => (c.id.as_deref(), Some(c.name.as_str())),
            CanonicalValue::Iteration(it) => (it.id.as_deref(), Some(it.title.as_str())),
            _ => (None, None),
        };

        let slot = id
            .and_then(|id| catalog.iter().position(|e| e.id == Some(id)))
            .or_else(|| name.and_then(|name| catalog.iter().position(|e| e.name == name)));

        match slot {
            Some(slot) => buckets[slot].item_indices.push(index),
            None => unassigned.push(index),
        }
    }

    if !unassigned.is_empty() {
        buckets.push(GroupBucket {
            label: BucketLabel {
                id: None,
                name: UNASSIGNED_LABEL.to_string(),
                color: None,
            },
            unassigned: true,
            item_indices: unassigned,
        });
    }

    GroupedItems { buckets }
}

/// Observed-value mode: buckets appear in first-seen order. Keys are the
/// first line of the display value, truncated, and lower-cased for
/// matching; the bucket label keeps the casing of the first item that
/// produced the key.
fn group_by_observed(items: &[Item], field: &FieldDefinition) -> GroupedItems {
    let mut buckets: Vec<GroupBucket> = Vec::new();
    let mut slot_by_key: HashMap<String, usize> = HashMap::new();
    let mut unassigned: Vec<usize> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let display = resolve_value(item, field)
            .display()
            .map(|d| bucket_key_text(&d))
            .filter(|d| !d.is_empty());

        match display {
            None => unassigned.push(index),
            Some(display) => {
                let key = display.to_lowercase();
                let slot = *slot_by_key.entry(key).or_insert_with(|| {
                    buckets.push(GroupBucket::named(BucketLabel {
                        id: None,
                        name: display,
                        color: None,
                    }));
                    buckets.len() - 1
                });
                buckets[slot].item_indices.push(index);
            }
        }
    }

    if !unassigned.is_empty() {
        buckets.push(GroupBucket {
            label: BucketLabel {
                id: None,
                name: UNASSIGNED_LABEL.to_string(),
                color: None,
            },
            unassigned: true,
            item_indices: unassigned,
        });
    }

    GroupedItems { buckets }
}

fn bucket_key_text(display: &str) -> String {
    let first_line = display.lines().next().unwrap_or("").trim();
    first_line.chars().take(MAX_KEY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDataType, FieldOption};
    use serde_json::json;

    fn status_field() -> FieldDefinition {
        FieldDefinition {
            id: "status".to_string(),
            name: "Status".to_string(),
            data_type: FieldDataType::SingleSelect,
            options: Some(
                ["Todo", "In Progress", "Done"]
                    .iter()
                    .enumerate()
                    .map(|(i, name)| FieldOption {
                        id: Some(format!("opt-{}", i)),
                        name: name.to_string(),
                        color: None,
                        description: None,
                    })
                    .collect(),
            ),
            configuration: None,
            repo_options: None,
        }
    }

    fn text_field(id: &str, name: &str) -> FieldDefinition {
        FieldDefinition {
            id: id.to_string(),
            name: name.to_string(),
            data_type: FieldDataType::Text,
            options: None,
            configuration: None,
            repo_options: None,
        }
    }

    fn item(id: &str, field_values: serde_json::Value) -> Item {
        serde_json::from_value(json!({ "id": id, "fieldValues": field_values })).unwrap()
    }

    #[test]
    fn test_catalog_grouping_keeps_catalog_order_with_unassigned_last() {
        let field = status_field();
        let items = vec![
            item("1", json!([{ "fieldId": "status", "name": "Todo" }])),
            item("2", json!([{ "fieldId": "status", "name": "Done" }])),
            item("3", json!([])),
        ];

        let grouped = group_items(&items, &field);
        let names: Vec<&str> = grouped.buckets.iter().map(|b| b.label.name.as_str()).collect();
        assert_eq!(names, vec!["Todo", "In Progress", "Done", UNASSIGNED_LABEL]);

        assert_eq!(grouped.buckets[0].item_indices, vec![0]);
        assert!(grouped.buckets[1].is_empty());
        assert_eq!(grouped.buckets[2].item_indices, vec![1]);
        assert!(grouped.buckets[3].unassigned);
        assert_eq!(grouped.buckets[3].item_indices, vec![2]);

        // The caller decides whether empty catalog buckets render.
        let shown = grouped.without_empty_buckets();
        let names: Vec<&str> = shown.buckets.iter().map(|b| b.label.name.as_str()).collect();
        assert_eq!(names, vec!["Todo", "Done", UNASSIGNED_LABEL]);
    }

    #[test]
    fn test_catalog_matching_is_id_first_then_case_sensitive_name() {
        let field = status_field();
        let items = vec![
            // Id match beats a name that would hit another bucket.
            item(
                "1",
                json!([{ "fieldId": "status", "option": { "id": "opt-2", "name": "Todo" } }]),
            ),
            // Wrong-case name does not match the catalog.
            item("2", json!([{ "fieldId": "status", "name": "todo" }])),
        ];

        let grouped = group_items(&items, &field);
        assert_eq!(grouped.buckets[2].item_indices, vec![0]); // Done bucket via id
        let last = grouped.buckets.last().unwrap();
        assert!(last.unassigned);
        assert_eq!(last.item_indices, vec![1]);
    }

    #[test]
    fn test_unassigned_omitted_when_every_item_matches() {
        let field = status_field();
        let items = vec![item("1", json!([{ "fieldId": "status", "name": "Todo" }]))];

        let grouped = group_items(&items, &field);
        assert!(grouped.buckets.iter().all(|b| !b.unassigned));
    }

    #[test]
    fn test_observed_grouping_normalizes_keys_but_keeps_first_casing() {
        let field = text_field("team", "Team");
        let items = vec![
            item("1", json!([{ "fieldId": "team", "text": "Platform" }])),
            item("2", json!([{ "fieldId": "team", "text": "platform" }])),
            item("3", json!([{ "fieldId": "team", "text": "PLATFORM" }])),
            item("4", json!([])),
        ];

        let grouped = group_items(&items, &field);
        assert_eq!(grouped.buckets.len(), 2);
        assert_eq!(grouped.buckets[0].label.name, "Platform");
        assert_eq!(grouped.buckets[0].item_indices, vec![0, 1, 2]);
        assert!(grouped.buckets[1].unassigned);
    }

    #[test]
    fn test_observed_grouping_truncates_multi_line_text() {
        let field = text_field("notes", "Notes");
        let long = format!("{}\nsecond line", "x".repeat(200));
        let items = vec![
            item("1", json!([{ "fieldId": "notes", "text": long }])),
            item("2", json!([{ "fieldId": "notes", "text": "x".repeat(200) }])),
        ];

        let grouped = group_items(&items, &field);
        // Both reduce to the same 120-char first-line key.
        assert_eq!(grouped.buckets.len(), 1);
        assert_eq!(grouped.buckets[0].label.name.chars().count(), 120);
        assert_eq!(grouped.buckets[0].item_indices, vec![0, 1]);
    }

    #[test]
    fn test_group_totality_catalog_and_observed() {
        let status = status_field();
        let team = text_field("team", "Team");
        let items = vec![
            item("1", json!([{ "fieldId": "status", "name": "Todo" },
                             { "fieldId": "team", "text": "Core" }])),
            item("2", json!([{ "fieldId": "status", "name": "nope" }])),
            item("3", json!([])),
        ];

        for field in [&status, &team] {
            let grouped = group_items(&items, field);
            assert_eq!(grouped.total_items(), items.len());
        }
    }
}
