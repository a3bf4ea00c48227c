pub mod atomic_writer;
pub mod json_preference_store;
pub mod memory;

pub use atomic_writer::AtomicWriter;
pub use json_preference_store::JsonPreferenceStore;
pub use memory::MemoryPreferenceStore;
