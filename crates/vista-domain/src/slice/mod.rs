//! Slice filtering.
//!
//! A slice narrows a view to items matching (or lacking) one field's
//! value. The same predicate backs row filtering and the slice panel's
//! value counts — the two must never diverge.

use serde::{Deserialize, Serialize};

use crate::field::FieldDefinition;
use crate::item::Item;
use crate::value::{resolve_value, CanonicalValue};

/// An active slice. `value: None` filters to items with *no* value for the
/// field — the presence of the selector itself is what makes a slice
/// active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceSelector {
    pub field_id: String,
    pub value: Option<String>,
}

impl SliceSelector {
    pub fn new(field_id: impl Into<String>, value: Option<String>) -> Self {
        Self {
            field_id: field_id.into(),
            value,
        }
    }
}

/// One row of the slice panel's value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceValueCount {
    /// `None` is the no-value row.
    pub value: Option<String>,
    pub count: usize,
}

/// Whether `item` passes the slice.
///
/// Scalar fields compare by strict equality of the resolved value's
/// identity (name or id); multi-valued fields test membership. A `None`
/// selector value matches items whose resolved value is absent.
pub fn matches(item: &Item, field: &FieldDefinition, selector: &SliceSelector) -> bool {
    let value = resolve_value(item, field);
    match &selector.value {
        None => value.is_empty(),
        Some(target) => match &value {
            CanonicalValue::Labels(entries) => entries
                .iter()
                .any(|l| l.name == *target || l.id.as_deref() == Some(target)),
            CanonicalValue::People(entries) => entries
                .iter()
                .any(|p| p.login == *target || p.id.as_deref() == Some(target)),
            CanonicalValue::Choice(c) => c.name == *target || c.id.as_deref() == Some(target),
            CanonicalValue::Iteration(it) => {
                it.title == *target || it.id.as_deref() == Some(target)
            }
            CanonicalValue::Text(s) => s == target,
            CanonicalValue::Date(d) => d == target,
            CanonicalValue::Number(n) => target.parse::<f64>().map(|t| t == *n).unwrap_or(false),
            CanonicalValue::Reference(r) => {
                r.title.as_deref() == Some(target)
                    || r.id.as_deref() == Some(target)
                    || r.number.map(|n| format!("#{}", n)).as_deref() == Some(target)
            }
            CanonicalValue::Empty => false,
        },
    }
}

/// Value counts for the slice panel.
///
/// Candidates come from the field catalog when one exists (all options,
/// including zero-count ones), otherwise from observed values in
/// first-seen order. Counts are computed through [`matches`] so the panel
/// and the applied filter always agree; a trailing no-value row appears
/// only when some item lacks a value.
pub fn tally(items: &[Item], field: &FieldDefinition) -> Vec<SliceValueCount> {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(catalog) = field.catalog() {
        candidates.extend(catalog.iter().map(|e| e.name.to_string()));
    } else {
        for item in items {
            for identity in identities(&resolve_value(item, field)) {
                if !candidates.contains(&identity) {
                    candidates.push(identity);
                }
            }
        }
    }

    let mut counts: Vec<SliceValueCount> = candidates
        .into_iter()
        .map(|candidate| {
            let selector = SliceSelector::new(field.id.clone(), Some(candidate.clone()));
            SliceValueCount {
                count: items.iter().filter(|i| matches(i, field, &selector)).count(),
                value: Some(candidate),
            }
        })
        .collect();

    let none_selector = SliceSelector::new(field.id.clone(), None);
    let none_count = items
        .iter()
        .filter(|i| matches(i, field, &none_selector))
        .count();
    if none_count > 0 {
        counts.push(SliceValueCount {
            value: None,
            count: none_count,
        });
    }

    counts
}

/// The identities a value contributes to the slice panel: one per entry
/// for multi-valued fields, the display identity for scalars.
fn identities(value: &CanonicalValue) -> Vec<String> {
    match value {
        CanonicalValue::Labels(entries) => entries.iter().map(|l| l.name.clone()).collect(),
        CanonicalValue::People(entries) => entries.iter().map(|p| p.login.clone()).collect(),
        _ => value.display().into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDataType, FieldOption};
    use serde_json::json;

    fn field(id: &str, data_type: FieldDataType) -> FieldDefinition {
        FieldDefinition {
            id: id.to_string(),
            name: id.to_string(),
            data_type,
            options: None,
            configuration: None,
            repo_options: None,
        }
    }

    fn item(id: &str, field_values: serde_json::Value) -> Item {
        serde_json::from_value(json!({ "id": id, "fieldValues": field_values })).unwrap()
    }

    #[test]
    fn test_scalar_equality_and_no_value() {
        let estimate = field("estimate", FieldDataType::Number);
        let three = item("1", json!([{ "fieldId": "estimate", "number": 3 }]));
        let none = item("2", json!([]));

        let selector = SliceSelector::new("estimate", Some("3".to_string()));
        assert!(matches(&three, &estimate, &selector));
        assert!(!matches(&none, &estimate, &selector));

        let no_value = SliceSelector::new("estimate", None);
        assert!(!matches(&three, &estimate, &no_value));
        assert!(matches(&none, &estimate, &no_value));
    }

    #[test]
    fn test_choice_matches_name_or_id() {
        let status = field("status", FieldDataType::SingleSelect);
        let done = item(
            "1",
            json!([{ "fieldId": "status", "option": { "name": "Done", "id": "opt-2" } }]),
        );

        assert!(matches(
            &done,
            &status,
            &SliceSelector::new("status", Some("Done".to_string()))
        ));
        assert!(matches(
            &done,
            &status,
            &SliceSelector::new("status", Some("opt-2".to_string()))
        ));
        assert!(!matches(
            &done,
            &status,
            &SliceSelector::new("status", Some("Todo".to_string()))
        ));
    }

    #[test]
    fn test_membership_for_multi_valued_fields() {
        let assignees = field("assignees", FieldDataType::Assignees);
        let item_both = item(
            "1",
            json!([{ "fieldId": "assignees",
                     "assignees": { "nodes": [ { "login": "ada" }, { "login": "bob" } ] } }]),
        );
        let item_none = item("2", json!([{ "fieldId": "assignees", "assignees": [] }]));

        let ada = SliceSelector::new("assignees", Some("ada".to_string()));
        assert!(matches(&item_both, &assignees, &ada));
        assert!(!matches(&item_none, &assignees, &ada));

        // Zero entries is "no value" for a multi-valued field.
        let no_value = SliceSelector::new("assignees", None);
        assert!(matches(&item_none, &assignees, &no_value));
        assert!(!matches(&item_both, &assignees, &no_value));
    }

    #[test]
    fn test_tally_counts_agree_with_predicate() {
        let labels = field("labels", FieldDataType::Labels);
        let items = vec![
            item(
                "1",
                json!([{ "fieldId": "labels", "labels": [ { "name": "bug" }, { "name": "ui" } ] }]),
            ),
            item("2", json!([{ "fieldId": "labels", "labels": [ { "name": "bug" } ] }])),
            item("3", json!([])),
        ];

        let counts = tally(&items, &labels);
        assert_eq!(
            counts,
            vec![
                SliceValueCount {
                    value: Some("bug".to_string()),
                    count: 2
                },
                SliceValueCount {
                    value: Some("ui".to_string()),
                    count: 1
                },
                SliceValueCount {
                    value: None,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_tally_uses_catalog_including_zero_counts() {
        let status = FieldDefinition {
            id: "status".to_string(),
            name: "Status".to_string(),
            data_type: FieldDataType::SingleSelect,
            options: Some(vec![
                FieldOption {
                    id: Some("opt-0".to_string()),
                    name: "Todo".to_string(),
                    color: None,
                    description: None,
                },
                FieldOption {
                    id: Some("opt-1".to_string()),
                    name: "Done".to_string(),
                    color: None,
                    description: None,
                },
            ]),
            configuration: None,
            repo_options: None,
        };
        let items = vec![item("1", json!([{ "fieldId": "status", "name": "Done" }]))];

        let counts = tally(&items, &status);
        assert_eq!(
            counts,
            vec![
                SliceValueCount {
                    value: Some("Todo".to_string()),
                    count: 0
                },
                SliceValueCount {
                    value: Some("Done".to_string()),
                    count: 1
                },
            ]
        );
    }
}
