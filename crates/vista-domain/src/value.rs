//! Canonical field values.
//!
//! Every consumer (sort, group, slice, display) goes through
//! [`resolve_value`] instead of probing raw payloads, so the shape ladders
//! live in exactly one place.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::field::{FieldDataType, FieldDefinition};
use crate::item::{FieldValue, Item};

/// A single-select option, milestone, or repository value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceValue {
    pub name: String,
    pub id: Option<String>,
    pub color: Option<String>,
}

/// An iteration value with its optional schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationValue {
    pub title: String,
    pub id: Option<String>,
    pub start_date: Option<String>,
    pub duration: Option<u32>,
}

/// An assignee or reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonValue {
    pub login: String,
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A reference to another item (parent issue).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceValue {
    pub title: Option<String>,
    pub number: Option<i64>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub repo: Option<String>,
}

/// The normalized, type-tagged value of one field on one item.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Text(String),
    Number(f64),
    /// A date the resolver has already validated; see [`parse_date`].
    Date(String),
    Choice(ChoiceValue),
    Iteration(IterationValue),
    Labels(Vec<ChoiceValue>),
    People(Vec<PersonValue>),
    Reference(ReferenceValue),
    Empty,
}

impl CanonicalValue {
    /// Whether this value counts as absent for sorting, grouping, and the
    /// no-value slice predicate. Multi-valued entries with zero elements
    /// are absent.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Labels(entries) => entries.is_empty(),
            Self::People(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Human label for fallback group keys and plain output. `None` when
    /// there is nothing to show.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Date(s) => Some(s.clone()),
            Self::Choice(c) => Some(c.name.clone()),
            Self::Iteration(i) => Some(i.title.clone()),
            Self::Labels(entries) => {
                if entries.is_empty() {
                    None
                } else {
                    Some(
                        entries
                            .iter()
                            .map(|l| l.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    )
                }
            }
            Self::People(entries) => {
                if entries.is_empty() {
                    None
                } else {
                    Some(
                        entries
                            .iter()
                            .map(|p| p.login.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    )
                }
            }
            Self::Reference(r) => r
                .title
                .clone()
                .or_else(|| r.number.map(|n| format!("#{}", n))),
            Self::Empty => None,
        }
    }
}

/// Parse a date value the way the engine compares them: plain `YYYY-MM-DD`
/// first, then an RFC 3339 timestamp truncated to its date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Resolve the canonical value of `field` on `item`.
///
/// Pure and total: malformed payloads, unknown data types, invalid dates,
/// and non-finite numbers all come back as `Empty` so one bad record never
/// aborts a render.
pub fn resolve_value(item: &Item, field: &FieldDefinition) -> CanonicalValue {
    let fv = item.field_value(field);
    match field.data_type {
        FieldDataType::Text => fv.map(resolve_text).unwrap_or(CanonicalValue::Empty),
        FieldDataType::Title => resolve_title(item, fv),
        FieldDataType::Number => fv.map(resolve_number).unwrap_or(CanonicalValue::Empty),
        FieldDataType::Date => fv.map(resolve_date).unwrap_or(CanonicalValue::Empty),
        FieldDataType::SingleSelect => fv
            .map(resolve_single_select)
            .unwrap_or(CanonicalValue::Empty),
        FieldDataType::Iteration => fv.map(resolve_iteration).unwrap_or(CanonicalValue::Empty),
        FieldDataType::Labels => fv.map(resolve_labels).unwrap_or(CanonicalValue::Empty),
        FieldDataType::Assignees => fv
            .map(|fv| resolve_people(fv, &["assignees", "users", "value"]))
            .unwrap_or(CanonicalValue::Empty),
        FieldDataType::Reviewers => fv
            .map(|fv| resolve_people(fv, &["reviewers", "users", "value"]))
            .unwrap_or(CanonicalValue::Empty),
        FieldDataType::Milestone => fv.map(resolve_milestone).unwrap_or(CanonicalValue::Empty),
        FieldDataType::Repository => resolve_repository(item, fv),
        FieldDataType::ParentIssue => fv.map(resolve_parent).unwrap_or(CanonicalValue::Empty),
        FieldDataType::Unknown => CanonicalValue::Empty,
    }
}

fn resolve_text(fv: &FieldValue) -> CanonicalValue {
    match first_string(&fv.payload, &["text", "value"]) {
        Some(text) => CanonicalValue::Text(text),
        None => CanonicalValue::Empty,
    }
}

fn resolve_title(item: &Item, fv: Option<&FieldValue>) -> CanonicalValue {
    if let Some(fv) = fv {
        if let Some(title) = first_string(&fv.payload, &["title", "text"]) {
            return CanonicalValue::Text(title);
        }
    }
    match item.content.as_ref().and_then(|c| c.title.clone()) {
        Some(title) if !title.trim().is_empty() => CanonicalValue::Text(title),
        _ => CanonicalValue::Empty,
    }
}

fn resolve_number(fv: &FieldValue) -> CanonicalValue {
    let number = first_present(&fv.payload, &["number", "value"]).and_then(number_of);
    match number {
        Some(n) => CanonicalValue::Number(n),
        None => CanonicalValue::Empty,
    }
}

fn resolve_date(fv: &FieldValue) -> CanonicalValue {
    match first_string(&fv.payload, &["date", "value"]) {
        Some(date) if parse_date(&date).is_some() => CanonicalValue::Date(date),
        _ => CanonicalValue::Empty,
    }
}

fn resolve_single_select(fv: &FieldValue) -> CanonicalValue {
    // Fresh payloads nest the chosen option; cached edits flatten it onto
    // the record itself; pickers may pass only a bare value string.
    if let Some(option) = first_present(&fv.payload, &["option"]) {
        if let Some(choice) = choice_of(option) {
            return CanonicalValue::Choice(choice);
        }
    }
    if let Some(name) = first_string(&fv.payload, &["name"]) {
        return CanonicalValue::Choice(ChoiceValue {
            name,
            id: first_string(&fv.payload, &["optionId", "id"]),
            color: first_string(&fv.payload, &["color"]),
        });
    }
    match first_string(&fv.payload, &["value"]) {
        Some(name) => CanonicalValue::Choice(ChoiceValue {
            name,
            id: None,
            color: None,
        }),
        None => CanonicalValue::Empty,
    }
}

fn resolve_iteration(fv: &FieldValue) -> CanonicalValue {
    if let Some(Value::Object(nested)) = first_present(&fv.payload, &["iteration"]) {
        if let Some(iteration) = iteration_of(nested) {
            return CanonicalValue::Iteration(iteration);
        }
    }
    if let Some(iteration) = iteration_of(&fv.payload) {
        return CanonicalValue::Iteration(iteration);
    }
    match first_string(&fv.payload, &["value"]) {
        Some(title) => CanonicalValue::Iteration(IterationValue {
            title,
            id: None,
            start_date: None,
            duration: None,
        }),
        None => CanonicalValue::Empty,
    }
}

fn resolve_labels(fv: &FieldValue) -> CanonicalValue {
    let entries = first_present(&fv.payload, &["labels", "value"])
        .map(|v| entries_of(v).into_iter().filter_map(choice_of).collect())
        .unwrap_or_else(Vec::new);
    CanonicalValue::Labels(entries)
}

fn resolve_people(fv: &FieldValue, keys: &[&str]) -> CanonicalValue {
    let entries = first_present(&fv.payload, keys)
        .map(|v| entries_of(v).into_iter().filter_map(person_of).collect())
        .unwrap_or_else(Vec::new);
    CanonicalValue::People(entries)
}

fn resolve_milestone(fv: &FieldValue) -> CanonicalValue {
    if let Some(milestone) = first_present(&fv.payload, &["milestone", "value"]) {
        if let Some(choice) = milestone_of(milestone) {
            return CanonicalValue::Choice(choice);
        }
    }
    match first_string(&fv.payload, &["title"]) {
        Some(title) => CanonicalValue::Choice(ChoiceValue {
            name: title,
            id: first_string(&fv.payload, &["id"]),
            color: None,
        }),
        None => CanonicalValue::Empty,
    }
}

fn resolve_repository(item: &Item, fv: Option<&FieldValue>) -> CanonicalValue {
    if let Some(fv) = fv {
        if let Some(repository) = first_present(&fv.payload, &["repository", "value"]) {
            if let Some(choice) = repository_of(repository) {
                return CanonicalValue::Choice(choice);
            }
        }
        if let Some(name) = first_string(&fv.payload, &["nameWithOwner", "name"]) {
            return CanonicalValue::Choice(ChoiceValue {
                name,
                id: None,
                color: None,
            });
        }
    }
    match item
        .content
        .as_ref()
        .and_then(|c| c.repository.as_ref())
        .and_then(repository_of)
    {
        Some(choice) => CanonicalValue::Choice(choice),
        None => CanonicalValue::Empty,
    }
}

fn resolve_parent(fv: &FieldValue) -> CanonicalValue {
    // Producers disagree on the wrapper key; take the first non-null in
    // this exact order.
    let parent = first_present(&fv.payload, &["parent", "parentIssue", "issue", "item", "value"]);
    let Some(parent) = parent else {
        return CanonicalValue::Empty;
    };
    match parent {
        Value::String(title) if !title.trim().is_empty() => {
            CanonicalValue::Reference(ReferenceValue {
                title: Some(title.clone()),
                ..ReferenceValue::default()
            })
        }
        Value::Object(obj) => {
            let reference = ReferenceValue {
                title: string_at(obj, "title"),
                number: obj.get("number").and_then(Value::as_i64),
                id: string_at(obj, "id"),
                url: string_at(obj, "url"),
                repo: obj
                    .get("repository")
                    .and_then(repository_of)
                    .map(|c| c.name)
                    .or_else(|| string_at(obj, "repository")),
            };
            if reference == ReferenceValue::default() {
                CanonicalValue::Empty
            } else {
                CanonicalValue::Reference(reference)
            }
        }
        _ => CanonicalValue::Empty,
    }
}

fn first_present<'a>(payload: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| payload.get(*key).filter(|v| !v.is_null()))
}

fn first_string(payload: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(payload, keys).and_then(|v| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn string_at(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn number_of(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// A multi-value payload is either a bare array or a `{ nodes: [...] }`
/// connection wrapper.
fn entries_of(v: &Value) -> Vec<&Value> {
    match v {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get("nodes") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn choice_of(v: &Value) -> Option<ChoiceValue> {
    match v {
        Value::String(name) if !name.trim().is_empty() => Some(ChoiceValue {
            name: name.clone(),
            id: None,
            color: None,
        }),
        Value::Object(obj) => string_at(obj, "name").map(|name| ChoiceValue {
            name,
            id: string_at(obj, "id"),
            color: string_at(obj, "color"),
        }),
        _ => None,
    }
}

fn person_of(v: &Value) -> Option<PersonValue> {
    match v {
        Value::String(login) if !login.trim().is_empty() => Some(PersonValue {
            login: login.clone(),
            id: None,
            name: None,
        }),
        Value::Object(obj) => string_at(obj, "login").map(|login| PersonValue {
            login,
            id: string_at(obj, "id"),
            name: string_at(obj, "name"),
        }),
        _ => None,
    }
}

fn iteration_of(obj: &Map<String, Value>) -> Option<IterationValue> {
    string_at(obj, "title").map(|title| IterationValue {
        title,
        id: string_at(obj, "id"),
        start_date: string_at(obj, "startDate"),
        duration: obj.get("duration").and_then(Value::as_u64).map(|d| d as u32),
    })
}

fn milestone_of(v: &Value) -> Option<ChoiceValue> {
    match v {
        Value::String(title) if !title.trim().is_empty() => Some(ChoiceValue {
            name: title.clone(),
            id: None,
            color: None,
        }),
        Value::Object(obj) => string_at(obj, "title").map(|title| ChoiceValue {
            name: title,
            id: string_at(obj, "id"),
            color: None,
        }),
        _ => None,
    }
}

fn repository_of(v: &Value) -> Option<ChoiceValue> {
    match v {
        Value::String(name) if !name.trim().is_empty() => Some(ChoiceValue {
            name: name.clone(),
            id: None,
            color: None,
        }),
        Value::Object(obj) => string_at(obj, "nameWithOwner")
            .or_else(|| string_at(obj, "name"))
            .map(|name| ChoiceValue {
                name,
                id: string_at(obj, "id"),
                color: None,
            }),
        _ => None,
    }
}
