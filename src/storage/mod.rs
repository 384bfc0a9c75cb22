pub mod memory;
pub mod record;

pub use memory::VersionedStore;
pub use record::VersionedRecord;
