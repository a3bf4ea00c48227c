use std::fmt;

/// The per-view aspects that persist locally. One storage entry exists per
/// view + aspect pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewAspect {
    SortConfig,
    HiddenFields,
    GroupDivisors,
    Slice,
    FieldOrder,
    ColumnWidths,
}

impl ViewAspect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SortConfig => "sortConfig",
            Self::HiddenFields => "hiddenFields",
            Self::GroupDivisors => "groupDivisors",
            Self::Slice => "slice",
            Self::FieldOrder => "fieldOrder",
            Self::ColumnWidths => "columnWidths",
        }
    }
}

/// Namespaced storage key: `<namespace>.<viewKey>.<aspect>`.
///
/// Keys are namespaced by view identifier and aspect name so concurrent
/// views never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreferenceKey {
    pub namespace: String,
    pub view_key: String,
    pub aspect: ViewAspect,
}

impl PreferenceKey {
    pub fn new(
        namespace: impl Into<String>,
        view_key: impl Into<String>,
        aspect: ViewAspect,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            view_key: view_key.into(),
            aspect,
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}.{}.{}", self.namespace, self.view_key, self.aspect.as_str())
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
