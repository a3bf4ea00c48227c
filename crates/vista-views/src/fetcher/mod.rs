//! View fetchers.
//!
//! One fetcher per open view owns that view's override state and latest
//! snapshot, and turns both into a materialized, ordered, filtered item
//! list for the presentation layer. Rendering fully replaces the previous
//! output — nothing is patched incrementally.

use std::collections::HashMap;

use vista_domain::{
    group_items, resolve_field, resolve_value, slice, sort_items, BucketLabel, CanonicalValue,
    FieldDefinition, Item, SliceSelector, SliceValueCount, SortConfig,
};
use vista_persistence::PreferenceStore;

use crate::channel::HostChannel;
use crate::overrides::{ViewDefaults, ViewOverrides};
use crate::protocol::{HostCommand, SnapshotMessage, SnapshotPayload, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Table,
    Board,
    Roadmap,
}

/// A numeric aggregate shown in a group header.
#[derive(Debug, Clone, PartialEq)]
pub struct DivisorCell {
    pub label: String,
    pub total: f64,
}

/// One displayable group of items.
#[derive(Debug, Clone)]
pub struct RenderedGroup {
    /// `None` for the single implicit group of an ungrouped view.
    pub label: Option<BucketLabel>,
    pub unassigned: bool,
    pub items: Vec<Item>,
    pub divisors: Vec<DivisorCell>,
}

/// Everything the presentation layer needs to paint one view, computed
/// fresh on every render pass.
#[derive(Debug, Clone)]
pub struct MaterializedView {
    pub view_key: String,
    pub error: Option<String>,
    pub effective_filter: Option<String>,
    /// Visible fields in display order.
    pub fields: Vec<FieldDefinition>,
    pub sort: Option<SortConfig>,
    pub slice: Option<SliceSelector>,
    pub groups: Vec<RenderedGroup>,
    /// Item count after slicing; always equals the sum of group sizes.
    pub total_items: usize,
    pub column_widths: HashMap<String, u32>,
}

pub struct ViewFetcher {
    view_key: String,
    kind: ViewKind,
    overrides: ViewOverrides,
    payload: Option<SnapshotPayload>,
    error: Option<String>,
    effective_filter: Option<String>,
    slice_panel_open: bool,
}

impl ViewFetcher {
    pub fn new(kind: ViewKind, namespace: impl Into<String>, view_key: impl Into<String>) -> Self {
        let view_key = view_key.into();
        Self {
            overrides: ViewOverrides::new(namespace, view_key.clone()),
            view_key,
            kind,
            payload: None,
            error: None,
            effective_filter: None,
            slice_panel_open: false,
        }
    }

    pub fn view_key(&self) -> &str {
        &self.view_key
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn overrides(&self) -> &ViewOverrides {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut ViewOverrides {
        &mut self.overrides
    }

    pub fn has_pending(&self) -> bool {
        self.overrides.has_pending()
    }

    pub fn slice_panel_open(&self) -> bool {
        self.slice_panel_open
    }

    pub fn open_slice_panel(&mut self) {
        self.slice_panel_open = true;
    }

    pub fn close_slice_panel(&mut self) {
        self.slice_panel_open = false;
    }

    /// Ask the host for a fresh snapshot. The reply arrives later as a
    /// `fields` message; until then the view renders whatever it has.
    pub fn request(&self, channel: &dyn HostChannel) {
        channel.post(HostCommand::RequestFields {
            view_key: self.view_key.clone(),
            first: DEFAULT_PAGE_SIZE,
        });
    }

    /// Accept a snapshot for this view, or ignore one addressed elsewhere.
    /// Returns whether the message was accepted.
    //
    // TODO: requestFields carries no sequence number, so a slow response
    // to a superseded request can still land here and overwrite newer
    // state. Needs a protocol change to fix.
    pub fn on_message(&mut self, message: &SnapshotMessage) -> bool {
        if message.view_key != self.view_key {
            tracing::debug!(
                "Ignoring snapshot for {} on view {}",
                message.view_key,
                self.view_key
            );
            return false;
        }
        self.error = message.error.clone();
        self.effective_filter = message.effective_filter.clone();
        if let Some(payload) = &message.payload {
            self.payload = Some(payload.clone());
        }
        true
    }

    /// Commit all pending edits, then re-request a snapshot so the next
    /// render reconciles against the host's view of the world.
    pub fn save(&mut self, store: &mut dyn PreferenceStore, channel: &dyn HostChannel) {
        if !self.overrides.has_pending() {
            return;
        }
        self.overrides.commit(store, channel);
        self.request(channel);
    }

    /// Drop all pending edits. A discarded slice edit also closes the
    /// slice panel.
    pub fn discard(&mut self) {
        let outcome = self.overrides.discard();
        if outcome.discarded_slice {
            self.slice_panel_open = false;
        }
    }

    /// Value counts for the slice panel, computed over the unsliced item
    /// set through the same predicate that filters rows.
    pub fn slice_values(&self, field_key: &str) -> Vec<SliceValueCount> {
        let Some(payload) = &self.payload else {
            return Vec::new();
        };
        match resolve_field(self.lookup_fields(payload), field_key) {
            Some(field) => slice::tally(&payload.items, field),
            None => Vec::new(),
        }
    }

    /// Materialize the view: slice, sort, group, and aggregate, using the
    /// effective value of every aspect.
    pub fn render(&self, store: &dyn PreferenceStore) -> MaterializedView {
        let Some(payload) = &self.payload else {
            return MaterializedView {
                view_key: self.view_key.clone(),
                error: self.error.clone(),
                effective_filter: self.effective_filter.clone(),
                fields: Vec::new(),
                sort: None,
                slice: None,
                groups: Vec::new(),
                total_items: 0,
                column_widths: HashMap::new(),
            };
        };

        let fields = self.lookup_fields(payload);
        let defaults = ViewDefaults::from_payload(payload);

        let slice_selector = self.overrides.effective_slice(store);
        let mut items: Vec<Item> = match &slice_selector {
            Some(selector) => match resolve_field(fields, &selector.field_id) {
                Some(field) => payload
                    .items
                    .iter()
                    .filter(|item| slice::matches(item, field, selector))
                    .cloned()
                    .collect(),
                // A slice on a vanished field filters nothing.
                None => payload.items.clone(),
            },
            None => payload.items.clone(),
        };

        let sort = self.overrides.effective_sort(store, &defaults);
        if let Some(config) = &sort {
            sort_items(&mut items, fields, config);
        }

        let grouping_key = match self.kind {
            ViewKind::Table | ViewKind::Roadmap => self.overrides.effective_grouping(&defaults),
            ViewKind::Board => self
                .overrides
                .effective_column_field(&defaults)
                .or_else(|| self.overrides.effective_grouping(&defaults)),
        };
        let divisors = self
            .overrides
            .effective_group_divisors(store, &defaults)
            .unwrap_or_default();

        let groups = match grouping_key
            .as_deref()
            .and_then(|key| resolve_field(fields, key))
        {
            Some(group_field) => {
                let grouped = group_items(&items, group_field);
                // Boards keep empty columns; tables and roadmaps drop them.
                let grouped = match self.kind {
                    ViewKind::Board => grouped,
                    _ => grouped.without_empty_buckets(),
                };
                grouped
                    .buckets
                    .into_iter()
                    .map(|bucket| {
                        let bucket_items: Vec<Item> = bucket
                            .item_indices
                            .iter()
                            .map(|&index| items[index].clone())
                            .collect();
                        RenderedGroup {
                            divisors: divisor_cells(&bucket_items, fields, &divisors),
                            label: Some(bucket.label),
                            unassigned: bucket.unassigned,
                            items: bucket_items,
                        }
                    })
                    .collect()
            }
            None => vec![RenderedGroup {
                divisors: divisor_cells(&items, fields, &divisors),
                label: None,
                unassigned: false,
                items: items.clone(),
            }],
        };

        let total_items = groups.iter().map(|g| g.items.len()).sum();

        MaterializedView {
            view_key: self.view_key.clone(),
            error: self.error.clone(),
            effective_filter: self.effective_filter.clone(),
            fields: visible_fields(fields, &payload.fields, store, &self.overrides, &defaults),
            sort,
            slice: slice_selector,
            groups,
            total_items,
            column_widths: self.overrides.effective_column_widths(store),
        }
    }

    /// Field definitions to resolve against: the full project catalog when
    /// the payload carries one, else the view's own fields.
    fn lookup_fields<'a>(&self, payload: &'a SnapshotPayload) -> &'a [FieldDefinition] {
        if payload.all_fields.is_empty() {
            &payload.fields
        } else {
            &payload.all_fields
        }
    }
}

/// Visible fields in display order: the effective field order first, then
/// any server fields the order does not mention yet, minus hidden fields.
fn visible_fields(
    lookup: &[FieldDefinition],
    server_fields: &[FieldDefinition],
    store: &dyn PreferenceStore,
    overrides: &ViewOverrides,
    defaults: &ViewDefaults,
) -> Vec<FieldDefinition> {
    let hidden = overrides.effective_hidden_fields(store, defaults);
    let order = overrides.effective_field_order(store, defaults);

    let mut fields: Vec<FieldDefinition> = Vec::new();
    for key in &order {
        if let Some(field) = resolve_field(lookup, key) {
            if !hidden.contains(&field.id) && !fields.iter().any(|f| f.id == field.id) {
                fields.push(field.clone());
            }
        }
    }
    for field in server_fields {
        if !hidden.contains(&field.id) && !fields.iter().any(|f| f.id == field.id) {
            fields.push(field.clone());
        }
    }
    fields
}

/// Numeric sums for the selected divisor fields over one group.
fn divisor_cells(
    items: &[Item],
    fields: &[FieldDefinition],
    divisors: &[String],
) -> Vec<DivisorCell> {
    divisors
        .iter()
        .filter_map(|key| resolve_field(fields, key))
        .map(|field| {
            let total = items
                .iter()
                .map(|item| match resolve_value(item, field) {
                    CanonicalValue::Number(n) => n,
                    _ => 0.0,
                })
                .sum();
            DivisorCell {
                label: field.name.clone(),
                total,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RecordingChannel;
    use serde_json::json;
    use vista_persistence::MemoryPreferenceStore;

    fn snapshot(view_key: &str) -> SnapshotMessage {
        serde_json::from_value(json!({
            "viewKey": view_key,
            "payload": {
                "id": "PVT_1",
                "items": [
                    { "id": "I1", "fieldValues": [
                        { "fieldId": "status", "name": "Todo" },
                        { "fieldId": "estimate", "number": 3 }
                    ]},
                    { "id": "I2", "fieldValues": [
                        { "fieldId": "status", "name": "Done" },
                        { "fieldId": "estimate", "number": 5 }
                    ]},
                    { "id": "I3", "fieldValues": [] }
                ],
                "fields": [
                    { "id": "title", "name": "Title", "dataType": "title" },
                    { "id": "status", "name": "Status", "dataType": "single_select",
                      "options": [
                          { "id": "opt-0", "name": "Todo" },
                          { "id": "opt-1", "name": "In Progress" },
                          { "id": "opt-2", "name": "Done" }
                      ] },
                    { "id": "estimate", "name": "Estimate", "dataType": "number" }
                ],
                "allFields": []
            }
        }))
        .unwrap()
    }

    fn fetcher_with_snapshot(kind: ViewKind) -> ViewFetcher {
        let mut fetcher = ViewFetcher::new(kind, "ns", "view-1");
        assert!(fetcher.on_message(&snapshot("view-1")));
        fetcher
    }

    #[test]
    fn test_messages_for_other_views_are_ignored() {
        let mut fetcher = ViewFetcher::new(ViewKind::Table, "ns", "view-1");
        assert!(!fetcher.on_message(&snapshot("view-2")));

        let store = MemoryPreferenceStore::new();
        assert_eq!(fetcher.render(&store).total_items, 0);
    }

    #[test]
    fn test_table_drops_empty_buckets_board_keeps_them() {
        let store = MemoryPreferenceStore::new();

        let mut table = fetcher_with_snapshot(ViewKind::Table);
        table.overrides_mut().set_grouping("Status");
        let rendered = table.render(&store);
        let names: Vec<_> = rendered
            .groups
            .iter()
            .map(|g| g.label.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Todo", "Done", "Unassigned"]);

        let mut board = fetcher_with_snapshot(ViewKind::Board);
        board.overrides_mut().set_column_field("Status");
        let rendered = board.render(&store);
        let names: Vec<_> = rendered
            .groups
            .iter()
            .map(|g| g.label.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Todo", "In Progress", "Done", "Unassigned"]);
    }

    #[test]
    fn test_render_places_every_item_exactly_once() {
        let store = MemoryPreferenceStore::new();
        let mut fetcher = fetcher_with_snapshot(ViewKind::Table);
        fetcher.overrides_mut().set_grouping("Status");

        let rendered = fetcher.render(&store);
        assert_eq!(rendered.total_items, 3);
        assert_eq!(
            rendered.groups.iter().map(|g| g.items.len()).sum::<usize>(),
            rendered.total_items
        );
    }

    #[test]
    fn test_slice_filters_rows() {
        let store = MemoryPreferenceStore::new();
        let mut fetcher = fetcher_with_snapshot(ViewKind::Table);
        fetcher
            .overrides_mut()
            .set_slice(SliceSelector::new("status", Some("Done".to_string())));

        let rendered = fetcher.render(&store);
        assert_eq!(rendered.total_items, 1);
        assert_eq!(rendered.groups[0].items[0].id, "I2");

        // Slicing to "no value" keeps only the bare item.
        fetcher
            .overrides_mut()
            .set_slice(SliceSelector::new("status", None));
        let rendered = fetcher.render(&store);
        assert_eq!(rendered.total_items, 1);
        assert_eq!(rendered.groups[0].items[0].id, "I3");
    }

    #[test]
    fn test_divisors_sum_numeric_fields_per_group() {
        let store = MemoryPreferenceStore::new();
        let mut fetcher = fetcher_with_snapshot(ViewKind::Table);
        fetcher.overrides_mut().set_grouping("Status");
        fetcher
            .overrides_mut()
            .set_group_divisors(vec!["estimate".to_string()]);

        let rendered = fetcher.render(&store);
        let todo = &rendered.groups[0];
        assert_eq!(todo.divisors, vec![DivisorCell { label: "Estimate".to_string(), total: 3.0 }]);
        let done = &rendered.groups[1];
        assert_eq!(done.divisors[0].total, 5.0);
    }

    #[test]
    fn test_save_requests_fresh_snapshot() {
        let mut store = MemoryPreferenceStore::new();
        let channel = RecordingChannel::new();
        let mut fetcher = fetcher_with_snapshot(ViewKind::Table);

        // Nothing pending: no traffic at all.
        fetcher.save(&mut store, &channel);
        assert!(channel.take().is_empty());

        fetcher
            .overrides_mut()
            .set_hidden_fields(vec!["estimate".to_string()]);
        fetcher.save(&mut store, &channel);

        let commands = channel.take();
        assert!(matches!(
            commands.first(),
            Some(HostCommand::SetViewHiddenFields { .. })
        ));
        assert!(matches!(
            commands.last(),
            Some(HostCommand::RequestFields { .. })
        ));
    }

    #[test]
    fn test_discard_closes_slice_panel() {
        let mut fetcher = fetcher_with_snapshot(ViewKind::Table);
        fetcher.open_slice_panel();
        fetcher
            .overrides_mut()
            .set_slice(SliceSelector::new("status", Some("Todo".to_string())));

        fetcher.discard();
        assert!(!fetcher.slice_panel_open());
        assert!(!fetcher.has_pending());
    }

    #[test]
    fn test_hidden_fields_and_order_shape_visible_columns() {
        let mut store = MemoryPreferenceStore::new();
        let mut fetcher = fetcher_with_snapshot(ViewKind::Table);

        fetcher
            .overrides_mut()
            .set_field_order(vec!["estimate".to_string(), "title".to_string()]);
        fetcher
            .overrides_mut()
            .set_hidden_fields(vec!["status".to_string()]);

        let rendered = fetcher.render(&store);
        let ids: Vec<_> = rendered.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["estimate", "title"]);

        // Commit, then render again: same answer, now from storage.
        let channel = RecordingChannel::new();
        fetcher.save(&mut store, &channel);
        let rendered = fetcher.render(&store);
        let ids: Vec<_> = rendered.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["estimate", "title"]);
    }

    #[test]
    fn test_slice_values_tally_over_unsliced_items() {
        let fetcher = fetcher_with_snapshot(ViewKind::Table);
        let counts = fetcher.slice_values("Status");
        assert_eq!(
            counts,
            vec![
                SliceValueCount { value: Some("Todo".to_string()), count: 1 },
                SliceValueCount { value: Some("In Progress".to_string()), count: 0 },
                SliceValueCount { value: Some("Done".to_string()), count: 1 },
                SliceValueCount { value: None, count: 1 },
            ]
        );
    }
}
