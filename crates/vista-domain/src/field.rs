use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of field data types a project can declare.
///
/// Payloads arrive in both snake_case and SCREAMING_SNAKE_CASE depending on
/// the producer, so both spellings deserialize. Anything else maps to
/// `Unknown`, which resolves to no value rather than failing the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataType {
    Text,
    Number,
    Date,
    SingleSelect,
    Iteration,
    Labels,
    Assignees,
    Reviewers,
    Milestone,
    Repository,
    ParentIssue,
    Title,
    Unknown,
}

impl Default for FieldDataType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl FieldDataType {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "number" => Self::Number,
            "date" => Self::Date,
            "single_select" => Self::SingleSelect,
            "iteration" => Self::Iteration,
            "labels" => Self::Labels,
            "assignees" => Self::Assignees,
            "reviewers" => Self::Reviewers,
            "milestone" => Self::Milestone,
            "repository" => Self::Repository,
            "parent_issue" => Self::ParentIssue,
            "title" => Self::Title,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for FieldDataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl FieldDataType {
    /// Multi-valued types carry a list of entries per item instead of a
    /// single scalar. Slice matching is membership for these.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::Labels | Self::Assignees | Self::Reviewers)
    }
}

/// A declared legal value of a single-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A declared iteration of an iteration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfiguration {
    #[serde(default)]
    pub iterations: Vec<Iteration>,
    #[serde(default)]
    pub completed_iterations: Vec<Iteration>,
}

/// A typed column/attribute defined on the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_type: FieldDataType,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub configuration: Option<FieldConfiguration>,
    /// Per-repository option catalogs for repo-scoped fields, keyed by repo.
    #[serde(default)]
    pub repo_options: Option<HashMap<String, Vec<FieldOption>>>,
}

/// One entry of a field's declared value catalog, borrowed from either the
/// option list or the iteration configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry<'a> {
    pub id: Option<&'a str>,
    pub name: &'a str,
    pub color: Option<&'a str>,
}

impl FieldDefinition {
    /// The field's declared, ordered value catalog, when it has one.
    ///
    /// Single-select fields expose their option list; iteration fields
    /// expose active iterations followed by completed ones, so items in a
    /// closed iteration still have a real bucket. All other types have no
    /// catalog and group by observed values.
    pub fn catalog(&self) -> Option<Vec<CatalogEntry<'_>>> {
        match self.data_type {
            FieldDataType::SingleSelect => self.options.as_ref().map(|opts| {
                opts.iter()
                    .map(|o| CatalogEntry {
                        id: o.id.as_deref(),
                        name: &o.name,
                        color: o.color.as_deref(),
                    })
                    .collect()
            }),
            FieldDataType::Iteration => self.configuration.as_ref().map(|config| {
                config
                    .iterations
                    .iter()
                    .chain(config.completed_iterations.iter())
                    .map(|it| CatalogEntry {
                        id: it.id.as_deref(),
                        name: &it.title,
                        color: None,
                    })
                    .collect()
            }),
            _ => None,
        }
    }

    /// Position of a catalog entry matched by id, then by name.
    pub fn catalog_position(&self, id: Option<&str>, name: Option<&str>) -> Option<usize> {
        let catalog = self.catalog()?;
        if let Some(id) = id {
            if let Some(pos) = catalog.iter().position(|e| e.id == Some(id)) {
                return Some(pos);
            }
        }
        name.and_then(|name| catalog.iter().position(|e| e.name == name))
    }
}

/// Look up a field by id or name.
///
/// Id matches win: the name pass only runs when no field has a matching id.
/// If two fields share a name the first declared one wins — callers that
/// need an unambiguous lookup must pass the id.
pub fn resolve_field<'a>(
    fields: &'a [FieldDefinition],
    key: &str,
) -> Option<&'a FieldDefinition> {
    fields
        .iter()
        .find(|f| f.id == key)
        .or_else(|| fields.iter().find(|f| f.name == key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_field(options: &[&str]) -> FieldDefinition {
        FieldDefinition {
            id: "F1".to_string(),
            name: "Status".to_string(),
            data_type: FieldDataType::SingleSelect,
            options: Some(
                options
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

    #[test]
    fn test_data_type_accepts_both_casings() {
        let lower: FieldDataType = serde_json::from_str("\"single_select\"").unwrap();
        let upper: FieldDataType = serde_json::from_str("\"SINGLE_SELECT\"").unwrap();
        assert_eq!(lower, FieldDataType::SingleSelect);
        assert_eq!(upper, FieldDataType::SingleSelect);
    }

    #[test]
    fn test_unknown_data_type_is_tolerated() {
        let parsed: FieldDataType = serde_json::from_str("\"tracked_by\"").unwrap();
        assert_eq!(parsed, FieldDataType::Unknown);
    }

    #[test]
    fn test_resolve_field_prefers_id() {
        let fields = vec![
            FieldDefinition {
                id: "Status".to_string(),
                name: "First".to_string(),
                data_type: FieldDataType::Text,
                options: None,
                configuration: None,
                repo_options: None,
            },
            FieldDefinition {
                id: "F2".to_string(),
                name: "Status".to_string(),
                data_type: FieldDataType::SingleSelect,
                options: None,
                configuration: None,
                repo_options: None,
            },
        ];

        // "Status" is both an id and a name; the id match wins.
        let resolved = resolve_field(&fields, "Status").unwrap();
        assert_eq!(resolved.name, "First");

        let by_name = resolve_field(&fields, "First").unwrap();
        assert_eq!(by_name.id, "Status");

        assert!(resolve_field(&fields, "missing").is_none());
    }

    #[test]
    fn test_catalog_order_matches_declaration() {
        let field = select_field(&["Todo", "In Progress", "Done"]);
        let catalog = field.catalog().unwrap();
        assert_eq!(
            catalog.iter().map(|e| e.name).collect::<Vec<_>>(),
            vec!["Todo", "In Progress", "Done"]
        );
    }

    #[test]
    fn test_iteration_catalog_appends_completed() {
        let field = FieldDefinition {
            id: "F3".to_string(),
            name: "Sprint".to_string(),
            data_type: FieldDataType::Iteration,
            options: None,
            configuration: Some(FieldConfiguration {
                iterations: vec![Iteration {
                    id: Some("it-2".to_string()),
                    title: "Sprint 2".to_string(),
                    start_date: Some("2026-02-01".to_string()),
                    duration: Some(14),
                }],
                completed_iterations: vec![Iteration {
                    id: Some("it-1".to_string()),
                    title: "Sprint 1".to_string(),
                    start_date: Some("2026-01-01".to_string()),
                    duration: Some(14),
                }],
            }),
            repo_options: None,
        };

        let catalog = field.catalog().unwrap();
        assert_eq!(
            catalog.iter().map(|e| e.name).collect::<Vec<_>>(),
            vec!["Sprint 2", "Sprint 1"]
        );
    }

    #[test]
    fn test_catalog_position_id_beats_name() {
        let mut field = select_field(&["Todo", "Done"]);
        // Give the second option a name colliding with the first's id.
        field.options.as_mut().unwrap()[1].name = "opt-0".to_string();

        assert_eq!(field.catalog_position(Some("opt-1"), None), Some(1));
        assert_eq!(field.catalog_position(None, Some("opt-0")), Some(1));
        assert_eq!(field.catalog_position(Some("opt-0"), Some("opt-0")), Some(0));
        assert_eq!(field.catalog_position(None, Some("missing")), None);
    }
}
