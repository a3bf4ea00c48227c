pub mod channel;
pub mod fetcher;
pub mod overrides;
pub mod protocol;
pub mod registry;

pub use channel::{HostChannel, MpscHostChannel, RecordingChannel};
pub use fetcher::{DivisorCell, MaterializedView, RenderedGroup, ViewFetcher, ViewKind};
pub use overrides::{DiscardOutcome, Override, ViewDefaults, ViewOverrides};
pub use protocol::{
    FieldRefNode, GroupingUpdate, HostCommand, HostMessage, NodeList, SnapshotMessage,
    SnapshotPayload, SortByNode, ViewDetails, DEFAULT_PAGE_SIZE,
};
pub use registry::ViewRegistry;
