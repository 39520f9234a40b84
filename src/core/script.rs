use crate::core::command::{Command, CommandOutput};
use crate::core::ConcurrentVersionedMap;
use crate::utils::error::{Result, VersionedMapError};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScriptEntry {
    pub line: usize,
    pub command: Command,
    pub output: CommandOutput,
}

pub struct ScriptRunner {
    map: Arc<ConcurrentVersionedMap<String, String>>,
    stop_on_error: bool,
}

impl ScriptRunner {
    pub fn new(map: Arc<ConcurrentVersionedMap<String, String>>, stop_on_error: bool) -> Self {
        Self { map, stop_on_error }
    }

    pub fn map(&self) -> &Arc<ConcurrentVersionedMap<String, String>> {
        &self.map
    }

    /// Parses every line before anything runs, so a bad line never leaves the map
    /// half-updated. All parse errors are logged; with `stop_on_error` the first one is
    /// returned, otherwise bad lines are skipped.
    pub fn parse(&self, source: &str) -> Result<Vec<(usize, Command)>> {
        let mut commands = Vec::new();
        let mut first_error: Option<VersionedMapError> = None;

        for (idx, text) in source.lines().enumerate() {
            let line = idx + 1;
            match Command::parse(line, text) {
                Ok(Some(command)) => commands.push((line, command)),
                Ok(None) => {}
                Err(e) => {
                    if self.stop_on_error {
                        tracing::error!("{}", e);
                        first_error.get_or_insert(e);
                    } else {
                        tracing::warn!("skipping: {}", e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(commands),
        }
    }

    pub fn run(&self, source: &str) -> Result<Vec<ScriptEntry>> {
        let commands = self.parse(source)?;
        tracing::debug!("executing {} commands", commands.len());

        let entries = commands
            .into_iter()
            .map(|(line, command)| {
                let output = command.apply(&self.map);
                if command.is_mutation() {
                    tracing::debug!(line, "{:?} -> {}", command, output);
                }
                ScriptEntry {
                    line,
                    command,
                    output,
                }
            })
            .collect();

        Ok(entries)
    }

    pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ScriptEntry>> {
        let source = std::fs::read_to_string(&path)?;
        tracing::info!("running script {}", path.as_ref().display());
        self.run(&source)
    }
}
