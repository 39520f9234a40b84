pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliCommand, CliConfig};
pub use config::TomlConfig;

pub use self::core::{
    command::{Command, CommandOutput},
    concurrent_map::ConcurrentVersionedMap,
    script::{ScriptEntry, ScriptRunner},
    stress::{run_stress, StressReport},
};
pub use domain::{
    model::{Element, Snapshot, Version},
    ports::VersionedMap,
};
pub use utils::error::{Result, VersionedMapError};
