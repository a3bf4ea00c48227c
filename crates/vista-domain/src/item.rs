use serde::{Deserialize, Serialize};

use crate::field::FieldDataType;
use crate::field::FieldDefinition;

/// One row/card of a view. Field values are an unordered collection with at
/// most one entry per field id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub content: Option<ItemContent>,
    #[serde(default)]
    pub field_values: Vec<FieldValue>,
}

/// The underlying issue/PR/draft content of an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub repository: Option<serde_json::Value>,
}

/// A raw per-field value as it arrives from the host.
///
/// Different producers populate different subsets of the shape (a fresh
/// server payload nests its option under `option`, a cached local edit may
/// carry a flat `name`), so the payload is kept as an opaque map and only
/// `value::resolve_value` interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default, rename = "type")]
    pub data_type: Option<FieldDataType>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// This item's raw value for a field. Id matches are preferred over
    /// name matches, mirroring `resolve_field`.
    pub fn field_value(&self, field: &FieldDefinition) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|fv| fv.field_id.as_deref() == Some(field.id.as_str()))
            .or_else(|| {
                self.field_values
                    .iter()
                    .find(|fv| fv.field_name.as_deref() == Some(field.name.as_str()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(id: &str, name: &str) -> FieldDefinition {
        FieldDefinition {
            id: id.to_string(),
            name: name.to_string(),
            data_type: FieldDataType::Text,
            options: None,
            configuration: None,
            repo_options: None,
        }
    }

    #[test]
    fn test_item_deserializes_with_missing_pieces() {
        let item: Item = serde_json::from_value(json!({ "id": "I1" })).unwrap();
        assert!(item.content.is_none());
        assert!(item.field_values.is_empty());
    }

    #[test]
    fn test_field_value_payload_captures_extra_keys() {
        let item: Item = serde_json::from_value(json!({
            "id": "I1",
            "fieldValues": [
                { "fieldId": "F1", "type": "text", "text": "hello", "richText": true }
            ]
        }))
        .unwrap();

        let fv = &item.field_values[0];
        assert_eq!(fv.field_id.as_deref(), Some("F1"));
        assert_eq!(fv.data_type, Some(FieldDataType::Text));
        assert_eq!(fv.payload.get("text"), Some(&json!("hello")));
        assert_eq!(fv.payload.get("richText"), Some(&json!(true)));
    }

    #[test]
    fn test_field_value_lookup_prefers_id_match() {
        let item: Item = serde_json::from_value(json!({
            "id": "I1",
            "fieldValues": [
                { "fieldName": "Status", "text": "by-name" },
                { "fieldId": "F1", "text": "by-id" }
            ]
        }))
        .unwrap();

        let status = field("F1", "Status");
        let fv = item.field_value(&status).unwrap();
        assert_eq!(fv.payload.get("text"), Some(&json!("by-id")));

        // Without an id match the name entry is found.
        let other = field("F9", "Status");
        let fv = item.field_value(&other).unwrap();
        assert_eq!(fv.payload.get("text"), Some(&json!("by-name")));

        assert!(item.field_value(&field("F9", "Estimate")).is_none());
    }
}
