//! Message contracts exchanged with the host process.
//!
//! The transport itself lives in the host; only the shapes matter here.
//! Inbound messages are keyed to a view so the engine can ignore traffic
//! for other views.

use serde::{Deserialize, Serialize};

use vista_domain::{FieldDefinition, Item, SliceSelector, SortDirection};

/// Page size requested from the host when a view loads.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Inbound message from the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum HostMessage {
    #[serde(rename = "fields")]
    Fields(SnapshotMessage),
}

impl HostMessage {
    pub fn view_key(&self) -> &str {
        match self {
            Self::Fields(snapshot) => &snapshot.view_key,
        }
    }
}

/// A fresh snapshot of one view's data, or an error in its place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMessage {
    pub view_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<SnapshotPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_filter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Fields currently shown by the view, in server order.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Every field the project defines, shown or not.
    #[serde(default)]
    pub all_fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub details: Option<ViewDetails>,
}

/// Server-side view configuration carried inside a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDetails {
    #[serde(default)]
    pub sort_by_fields: Option<NodeList<SortByNode>>,
    #[serde(default)]
    pub group_by_fields: Option<NodeList<FieldRefNode>>,
    #[serde(default)]
    pub vertical_group_by_fields: Option<NodeList<FieldRefNode>>,
    #[serde(default)]
    pub group_divisors: Option<NodeList<FieldRefNode>>,
}

/// GraphQL-style connection wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeList<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRefNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl FieldRefNode {
    /// The id when present, otherwise the name — the same dual-key
    /// convention field lookup uses.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortByNode {
    #[serde(default)]
    pub field: Option<FieldRefNode>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

/// Outbound commands. Fire-and-forget: no acknowledgment is awaited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostCommand {
    RequestFields {
        view_key: String,
        first: u32,
    },
    SetViewGrouping {
        view_key: String,
        grouping: GroupingUpdate,
    },
    SetViewHiddenFields {
        view_key: String,
        hidden_fields: Vec<String>,
    },
    SetViewGroupDivisors {
        view_key: String,
        group_divisors: Option<Vec<String>>,
    },
    SetViewSlice {
        view_key: String,
        slice: Option<SliceSelector>,
    },
}

/// Payload of `setViewGrouping`. An absent axis is unchanged; an empty
/// list clears that axis. Both the table grouping and the board column
/// field commit through this one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_group_by: Option<Vec<String>>,
}
