pub mod command;
pub mod concurrent_map;
pub mod script;
pub mod stress;

pub use crate::domain::model::{Element, Snapshot, Version};
pub use crate::domain::ports::VersionedMap;
pub use crate::utils::error::Result;
pub use concurrent_map::ConcurrentVersionedMap;
