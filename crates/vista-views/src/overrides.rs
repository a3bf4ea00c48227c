//! Per-view override resolution.
//!
//! Every configurable aspect of a view resolves through the same chain on
//! every render: pending in-memory edit, then persisted local preference,
//! then server-supplied default. Pending edits flush to the host and to
//! storage on Save and vanish on Discard.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

use vista_domain::{SliceSelector, SortConfig, SortDirection};
use vista_persistence::{PreferenceKey, PreferenceStore, ViewAspect};

use crate::channel::HostChannel;
use crate::protocol::{GroupingUpdate, HostCommand, SnapshotPayload};

/// Pending state of one aspect.
///
/// `NoOverride` means the user has not touched the aspect; `Cleared` is an
/// explicit edit to remove the configured value. Conflating the two is the
/// bug class this type exists to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override<T> {
    NoOverride,
    Cleared,
    Set(T),
}

impl<T> Default for Override<T> {
    fn default() -> Self {
        Self::NoOverride
    }
}

impl<T> Override<T> {
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::NoOverride)
    }

    pub fn set(&mut self, value: T) {
        *self = Self::Set(value);
    }

    pub fn clear(&mut self) {
        *self = Self::Cleared;
    }

    pub fn reset(&mut self) {
        *self = Self::NoOverride;
    }
}

/// View configuration derived from the server snapshot. The last tier of
/// the resolution chain.
#[derive(Debug, Clone, Default)]
pub struct ViewDefaults {
    pub sort: Option<SortConfig>,
    pub grouping: Option<String>,
    pub column_field: Option<String>,
    pub group_divisors: Option<Vec<String>>,
    pub hidden_fields: Vec<String>,
    pub field_order: Vec<String>,
}

impl ViewDefaults {
    pub fn from_payload(payload: &SnapshotPayload) -> Self {
        let details = payload.details.as_ref();

        let sort = details
            .and_then(|d| d.sort_by_fields.as_ref())
            .and_then(|list| {
                let mut nodes = list.nodes.iter();
                let primary = nodes.next()?;
                let field_id = primary.field.as_ref().and_then(|f| f.key())?.to_string();
                let direction = primary.direction.unwrap_or(SortDirection::Asc);
                let mut config = SortConfig::new(field_id, direction);
                if let Some(secondary) = nodes.next() {
                    if let Some(key) = secondary.field.as_ref().and_then(|f| f.key()) {
                        config = config.with_secondary(
                            key,
                            secondary.direction.unwrap_or(SortDirection::Asc),
                        );
                    }
                }
                Some(config)
            });

        let first_field_key = |list: &Option<crate::protocol::NodeList<crate::protocol::FieldRefNode>>| {
            list.as_ref()
                .and_then(|l| l.nodes.first())
                .and_then(|node| node.key())
                .map(str::to_string)
        };

        let grouping = details.and_then(|d| first_field_key(&d.group_by_fields));
        let column_field = details.and_then(|d| first_field_key(&d.vertical_group_by_fields));

        let group_divisors = details.and_then(|d| d.group_divisors.as_ref()).map(|list| {
            list.nodes
                .iter()
                .filter_map(|node| node.key().map(str::to_string))
                .collect()
        });

        // Hidden by default: everything the project defines that the view
        // does not currently show.
        let shown: Vec<&str> = payload.fields.iter().map(|f| f.id.as_str()).collect();
        let hidden_fields = payload
            .all_fields
            .iter()
            .filter(|f| !shown.contains(&f.id.as_str()))
            .map(|f| f.id.clone())
            .collect();

        let field_order = payload.fields.iter().map(|f| f.id.clone()).collect();

        Self {
            sort,
            grouping,
            column_field,
            group_divisors,
            hidden_fields,
            field_order,
        }
    }
}

/// What a discard threw away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscardOutcome {
    pub had_pending: bool,
    /// A pending slice edit was dropped; any open slice panel must close
    /// with it.
    pub discarded_slice: bool,
}

/// Pending override state for one view. Owned by that view's fetcher.
#[derive(Debug, Clone)]
pub struct ViewOverrides {
    namespace: String,
    view_key: String,
    sort: Override<SortConfig>,
    grouping: Override<String>,
    column_field: Override<String>,
    group_divisors: Override<Vec<String>>,
    hidden_fields: Override<Vec<String>>,
    slice: Override<SliceSelector>,
    field_order: Override<Vec<String>>,
    column_widths: Override<HashMap<String, u32>>,
}

impl ViewOverrides {
    pub fn new(namespace: impl Into<String>, view_key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            view_key: view_key.into(),
            sort: Override::NoOverride,
            grouping: Override::NoOverride,
            column_field: Override::NoOverride,
            group_divisors: Override::NoOverride,
            hidden_fields: Override::NoOverride,
            slice: Override::NoOverride,
            field_order: Override::NoOverride,
            column_widths: Override::NoOverride,
        }
    }

    pub fn view_key(&self) -> &str {
        &self.view_key
    }

    pub fn has_pending(&self) -> bool {
        self.sort.is_pending()
            || self.grouping.is_pending()
            || self.column_field.is_pending()
            || self.group_divisors.is_pending()
            || self.hidden_fields.is_pending()
            || self.slice.is_pending()
            || self.field_order.is_pending()
            || self.column_widths.is_pending()
    }

    // Edit entry points, called from menu/picker callbacks.

    pub fn set_sort(&mut self, config: SortConfig) {
        self.sort.set(config);
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
    }

    pub fn set_grouping(&mut self, field_key: impl Into<String>) {
        self.grouping.set(field_key.into());
    }

    pub fn clear_grouping(&mut self) {
        self.grouping.clear();
    }

    pub fn set_column_field(&mut self, field_key: impl Into<String>) {
        self.column_field.set(field_key.into());
    }

    pub fn clear_column_field(&mut self) {
        self.column_field.clear();
    }

    pub fn set_group_divisors(&mut self, divisors: Vec<String>) {
        self.group_divisors.set(divisors);
    }

    pub fn clear_group_divisors(&mut self) {
        self.group_divisors.clear();
    }

    pub fn set_hidden_fields(&mut self, hidden: Vec<String>) {
        self.hidden_fields.set(hidden);
    }

    pub fn clear_hidden_fields(&mut self) {
        self.hidden_fields.clear();
    }

    pub fn set_slice(&mut self, selector: SliceSelector) {
        self.slice.set(selector);
    }

    pub fn clear_slice(&mut self) {
        self.slice.clear();
    }

    pub fn set_field_order(&mut self, order: Vec<String>) {
        self.field_order.set(order);
    }

    pub fn set_column_widths(&mut self, widths: HashMap<String, u32>) {
        self.column_widths.set(widths);
    }

    // Effective values: pending > persisted > server default, always.

    pub fn effective_sort(
        &self,
        store: &dyn PreferenceStore,
        defaults: &ViewDefaults,
    ) -> Option<SortConfig> {
        match &self.sort {
            Override::Set(config) => Some(config.clone()),
            Override::Cleared => None,
            Override::NoOverride => self
                .persisted(store, ViewAspect::SortConfig)
                .or_else(|| defaults.sort.clone()),
        }
    }

    /// Grouping has no persisted key; the host owns its durable state.
    pub fn effective_grouping(&self, defaults: &ViewDefaults) -> Option<String> {
        match &self.grouping {
            Override::Set(key) => Some(key.clone()),
            Override::Cleared => None,
            Override::NoOverride => defaults.grouping.clone(),
        }
    }

    /// Same contract as grouping: pending over server, nothing local.
    pub fn effective_column_field(&self, defaults: &ViewDefaults) -> Option<String> {
        match &self.column_field {
            Override::Set(key) => Some(key.clone()),
            Override::Cleared => None,
            Override::NoOverride => defaults.column_field.clone(),
        }
    }

    pub fn effective_group_divisors(
        &self,
        store: &dyn PreferenceStore,
        defaults: &ViewDefaults,
    ) -> Option<Vec<String>> {
        match &self.group_divisors {
            Override::Set(divisors) => Some(divisors.clone()),
            Override::Cleared => None,
            Override::NoOverride => self
                .persisted(store, ViewAspect::GroupDivisors)
                .or_else(|| defaults.group_divisors.clone()),
        }
    }

    pub fn effective_hidden_fields(
        &self,
        store: &dyn PreferenceStore,
        defaults: &ViewDefaults,
    ) -> Vec<String> {
        match &self.hidden_fields {
            Override::Set(hidden) => hidden.clone(),
            Override::Cleared => Vec::new(),
            Override::NoOverride => self
                .persisted(store, ViewAspect::HiddenFields)
                .unwrap_or_else(|| defaults.hidden_fields.clone()),
        }
    }

    /// A slice has no server default: no selector means no slice.
    pub fn effective_slice(&self, store: &dyn PreferenceStore) -> Option<SliceSelector> {
        match &self.slice {
            Override::Set(selector) => Some(selector.clone()),
            Override::Cleared => None,
            Override::NoOverride => self.persisted(store, ViewAspect::Slice),
        }
    }

    pub fn effective_field_order(
        &self,
        store: &dyn PreferenceStore,
        defaults: &ViewDefaults,
    ) -> Vec<String> {
        match &self.field_order {
            Override::Set(order) => order.clone(),
            Override::Cleared => defaults.field_order.clone(),
            Override::NoOverride => self
                .persisted(store, ViewAspect::FieldOrder)
                .unwrap_or_else(|| defaults.field_order.clone()),
        }
    }

    pub fn effective_column_widths(&self, store: &dyn PreferenceStore) -> HashMap<String, u32> {
        match &self.column_widths {
            Override::Set(widths) => widths.clone(),
            Override::Cleared => HashMap::new(),
            Override::NoOverride => self
                .persisted(store, ViewAspect::ColumnWidths)
                .unwrap_or_default(),
        }
    }

    /// Commit every pending aspect: send the host command where one
    /// exists, write or remove the persisted entry where one exists, then
    /// reset to no-override. Returns the commands that were posted.
    ///
    /// Storage failures are logged and swallowed — a full disk must not
    /// keep Save from reaching the host.
    pub fn commit(
        &mut self,
        store: &mut dyn PreferenceStore,
        channel: &dyn HostChannel,
    ) -> Vec<HostCommand> {
        let mut commands = Vec::new();

        match std::mem::take(&mut self.sort) {
            Override::NoOverride => {}
            Override::Cleared => self.remove(store, ViewAspect::SortConfig),
            Override::Set(config) => self.persist(store, ViewAspect::SortConfig, &config),
        }

        // Both grouping axes ride one setViewGrouping command.
        let mut grouping_update = GroupingUpdate::default();
        match std::mem::take(&mut self.grouping) {
            Override::NoOverride => {}
            Override::Cleared => grouping_update.group_by = Some(Vec::new()),
            Override::Set(key) => grouping_update.group_by = Some(vec![key]),
        }
        match std::mem::take(&mut self.column_field) {
            Override::NoOverride => {}
            Override::Cleared => grouping_update.vertical_group_by = Some(Vec::new()),
            Override::Set(key) => grouping_update.vertical_group_by = Some(vec![key]),
        }
        if grouping_update != GroupingUpdate::default() {
            commands.push(HostCommand::SetViewGrouping {
                view_key: self.view_key.clone(),
                grouping: grouping_update,
            });
        }

        match std::mem::take(&mut self.group_divisors) {
            Override::NoOverride => {}
            Override::Cleared => {
                self.remove(store, ViewAspect::GroupDivisors);
                commands.push(HostCommand::SetViewGroupDivisors {
                    view_key: self.view_key.clone(),
                    group_divisors: None,
                });
            }
            Override::Set(divisors) => {
                self.persist(store, ViewAspect::GroupDivisors, &divisors);
                commands.push(HostCommand::SetViewGroupDivisors {
                    view_key: self.view_key.clone(),
                    group_divisors: Some(divisors),
                });
            }
        }

        match std::mem::take(&mut self.hidden_fields) {
            Override::NoOverride => {}
            Override::Cleared => {
                self.remove(store, ViewAspect::HiddenFields);
                commands.push(HostCommand::SetViewHiddenFields {
                    view_key: self.view_key.clone(),
                    hidden_fields: Vec::new(),
                });
            }
            Override::Set(hidden) => {
                self.persist(store, ViewAspect::HiddenFields, &hidden);
                commands.push(HostCommand::SetViewHiddenFields {
                    view_key: self.view_key.clone(),
                    hidden_fields: hidden,
                });
            }
        }

        match std::mem::take(&mut self.slice) {
            Override::NoOverride => {}
            Override::Cleared => {
                self.remove(store, ViewAspect::Slice);
                commands.push(HostCommand::SetViewSlice {
                    view_key: self.view_key.clone(),
                    slice: None,
                });
            }
            Override::Set(selector) => {
                self.persist(store, ViewAspect::Slice, &selector);
                commands.push(HostCommand::SetViewSlice {
                    view_key: self.view_key.clone(),
                    slice: Some(selector),
                });
            }
        }

        match std::mem::take(&mut self.field_order) {
            Override::NoOverride => {}
            Override::Cleared => self.remove(store, ViewAspect::FieldOrder),
            Override::Set(order) => self.persist(store, ViewAspect::FieldOrder, &order),
        }

        match std::mem::take(&mut self.column_widths) {
            Override::NoOverride => {}
            Override::Cleared => self.remove(store, ViewAspect::ColumnWidths),
            Override::Set(widths) => self.persist(store, ViewAspect::ColumnWidths, &widths),
        }

        for command in &commands {
            channel.post(command.clone());
        }
        commands
    }

    /// Drop every pending aspect without touching storage or the host.
    pub fn discard(&mut self) -> DiscardOutcome {
        let outcome = DiscardOutcome {
            had_pending: self.has_pending(),
            discarded_slice: self.slice.is_pending(),
        };
        self.sort.reset();
        self.grouping.reset();
        self.column_field.reset();
        self.group_divisors.reset();
        self.hidden_fields.reset();
        self.slice.reset();
        self.field_order.reset();
        self.column_widths.reset();
        outcome
    }

    fn key(&self, aspect: ViewAspect) -> PreferenceKey {
        PreferenceKey::new(self.namespace.clone(), self.view_key.clone(), aspect)
    }

    fn persisted<T: DeserializeOwned>(
        &self,
        store: &dyn PreferenceStore,
        aspect: ViewAspect,
    ) -> Option<T> {
        match store.get(&self.key(aspect)) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable persisted value for {}: {}",
                        self.key(aspect),
                        e
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Preference read failed for {}: {}", self.key(aspect), e);
                None
            }
        }
    }

    fn persist<T: Serialize>(&self, store: &mut dyn PreferenceStore, aspect: ViewAspect, value: &T) {
        let serialized = match serde_json::to_value(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!("Could not serialize {}: {}", self.key(aspect), e);
                return;
            }
        };
        if let Err(e) = store.set(&self.key(aspect), serialized) {
            tracing::warn!("Preference write failed for {}: {}", self.key(aspect), e);
        }
    }

    fn remove(&self, store: &mut dyn PreferenceStore, aspect: ViewAspect) {
        if let Err(e) = store.remove(&self.key(aspect)) {
            tracing::warn!("Preference removal failed for {}: {}", self.key(aspect), e);
        }
    }
}
