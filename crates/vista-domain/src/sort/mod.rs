//! Item sorting.
//!
//! Builds a stable total order over items for a primary (and optional
//! secondary) field + direction pair, with type-specific comparators.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::field::{resolve_field, FieldDataType, FieldDefinition};
use crate::item::Item;
use crate::value::{parse_date, resolve_value, CanonicalValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A single sort axis. Never mutated in place, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub field_id: String,
    pub direction: SortDirection,
}

/// The full sort configuration of a view: one primary axis and at most one
/// secondary axis. There is no tertiary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub field_id: String,
    pub direction: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SortKey>,
}

impl SortConfig {
    pub fn new(field_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field_id: field_id.into(),
            direction,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, field_id: impl Into<String>, direction: SortDirection) -> Self {
        self.secondary = Some(SortKey {
            field_id: field_id.into(),
            direction,
        });
        self
    }
}

/// Stable in-place sort of `items` by `config`.
///
/// The sort field is looked up by id or name; if it cannot be resolved the
/// call is a no-op. The secondary key is consulted only on primary ties.
pub fn sort_items(items: &mut [Item], fields: &[FieldDefinition], config: &SortConfig) {
    let Some(primary) = resolve_field(fields, &config.field_id) else {
        return;
    };
    let secondary = config
        .secondary
        .as_ref()
        .and_then(|key| resolve_field(fields, &key.field_id).map(|f| (f, key.direction)));

    items.sort_by(|a, b| {
        let mut ordering = compare_items(a, b, primary, config.direction);
        if ordering == Ordering::Equal {
            if let Some((field, direction)) = secondary {
                ordering = compare_items(a, b, field, direction);
            }
        }
        ordering
    });
}

/// Compare two items on one field.
///
/// Absence is not "smaller", it is worst: an item without a value sorts
/// last under either direction, so only present-vs-present comparisons are
/// inverted by `direction`.
fn compare_items(a: &Item, b: &Item, field: &FieldDefinition, direction: SortDirection) -> Ordering {
    let va = resolve_value(a, field);
    let vb = resolve_value(b, field);
    match (va.is_empty(), vb.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => direction.apply(compare_values(&va, &vb, field)),
    }
}

fn compare_values(a: &CanonicalValue, b: &CanonicalValue, field: &FieldDefinition) -> Ordering {
    match field.data_type {
        FieldDataType::Number => match (a, b) {
            (CanonicalValue::Number(na), CanonicalValue::Number(nb)) => {
                na.partial_cmp(nb).unwrap_or(Ordering::Equal)
            }
            _ => compare_display(a, b),
        },
        FieldDataType::Date => match (a, b) {
            (CanonicalValue::Date(da), CanonicalValue::Date(db)) => {
                match (parse_date(da), parse_date(db)) {
                    (Some(da), Some(db)) => da.cmp(&db),
                    _ => compare_display(a, b),
                }
            }
            _ => compare_display(a, b),
        },
        FieldDataType::SingleSelect => compare_choices(a, b, field),
        FieldDataType::Iteration => compare_iterations(a, b),
        FieldDataType::Labels => match (a, b) {
            (CanonicalValue::Labels(la), CanonicalValue::Labels(lb)) => {
                // Multi-value fields reduce to the first entry for ordering.
                match (la.first(), lb.first()) {
                    (Some(fa), Some(fb)) => ci_compare(&fa.name, &fb.name),
                    _ => Ordering::Equal,
                }
            }
            _ => compare_display(a, b),
        },
        FieldDataType::Assignees | FieldDataType::Reviewers => match (a, b) {
            (CanonicalValue::People(pa), CanonicalValue::People(pb)) => {
                match (pa.first(), pb.first()) {
                    (Some(fa), Some(fb)) => ci_compare(&fa.login, &fb.login),
                    _ => Ordering::Equal,
                }
            }
            _ => compare_display(a, b),
        },
        _ => compare_display(a, b),
    }
}

/// Single-select values order by catalog position when both sides resolve
/// to one — the catalog carries the user's intended order (Todo before
/// Done). Name comparison is only the fallback.
fn compare_choices(a: &CanonicalValue, b: &CanonicalValue, field: &FieldDefinition) -> Ordering {
    let position = |value: &CanonicalValue| match value {
        CanonicalValue::Choice(c) => {
            field.catalog_position(c.id.as_deref(), Some(c.name.as_str()))
        }
        _ => None,
    };
    match (position(a), position(b)) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        _ => compare_display(a, b),
    }
}

fn compare_iterations(a: &CanonicalValue, b: &CanonicalValue) -> Ordering {
    let (CanonicalValue::Iteration(ia), CanonicalValue::Iteration(ib)) = (a, b) else {
        return compare_display(a, b);
    };
    let start = |it: &crate::value::IterationValue| {
        it.start_date.as_deref().and_then(parse_date)
    };
    match (start(ia), start(ib)) {
        (Some(sa), Some(sb)) => sa.cmp(&sb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => ci_compare(&ia.title, &ib.title),
    }
}

fn compare_display(a: &CanonicalValue, b: &CanonicalValue) -> Ordering {
    let da = a.display().unwrap_or_default();
    let db = b.display().unwrap_or_default();
    ci_compare(&da, &db)
}

fn ci_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
