//! Generic entity-store interface and implementations.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::{decode_records, EntityStore};
