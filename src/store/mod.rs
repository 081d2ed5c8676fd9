//! Person store abstraction and the in-memory implementation

mod memory;
mod traits;

pub use memory::MemoryPersonStore;
pub use traits::PersonStore;
