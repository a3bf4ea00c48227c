pub mod field;
pub mod group;
pub mod item;
pub mod slice;
pub mod sort;
pub mod value;

pub use field::{
    resolve_field, CatalogEntry, FieldConfiguration, FieldDataType, FieldDefinition, FieldOption,
    Iteration,
};
pub use group::{group_items, BucketLabel, GroupBucket, GroupedItems};
pub use item::{FieldValue, Item, ItemContent};
pub use slice::{SliceSelector, SliceValueCount};
pub use sort::{sort_items, SortConfig, SortDirection, SortKey};
pub use value::{
    resolve_value, CanonicalValue, ChoiceValue, IterationValue, PersonValue, ReferenceValue,
};
