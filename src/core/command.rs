use crate::core::{ConcurrentVersionedMap, Element, Snapshot, Version, VersionedMap};
use crate::utils::error::{Result, VersionedMapError};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// `key` or `key@version`. Keys may not contain whitespace or `@`.
fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?P<key>[^@\s]+)(?:@(?P<version>\d+))?$").unwrap())
}

/// `@version` as used by `snapshot`.
fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^@(?P<version>\d+)$").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, value: String },
    Get { key: String, version: Option<Version> },
    Delete { key: String },
    Version,
    Clear,
    History { key: String },
    Snapshot { version: Option<Version> },
    Keys,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutput {
    Version {
        version: Version,
    },
    Value {
        key: String,
        version: Option<Version>,
        value: Option<String>,
    },
    Cleared,
    History {
        key: String,
        elements: Vec<Element<String>>,
    },
    Snapshot {
        snapshot: Snapshot<String, String>,
    },
    Keys {
        keys: Vec<String>,
    },
}

fn parse_error(line: usize, message: impl Into<String>) -> VersionedMapError {
    VersionedMapError::ParseError {
        line,
        message: message.into(),
    }
}

fn parse_version(line: usize, raw: &str) -> Result<Version> {
    raw.parse::<Version>()
        .map_err(|e| parse_error(line, format!("invalid version '{}': {}", raw, e)))
}

/// Splits off the first whitespace-delimited token.
fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

fn parse_key(line: usize, command: &str, raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(parse_error(line, format!("'{}' needs a key", command)));
    }
    if raw.contains('@') {
        return Err(parse_error(
            line,
            format!("key '{}' may not contain '@'", raw),
        ));
    }
    Ok(raw.to_string())
}

fn expect_end(line: usize, command: &str, rest: &str) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(parse_error(
            line,
            format!("unexpected text after '{}': '{}'", command, rest),
        ))
    }
}

impl Command {
    /// Parses one script line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse(line: usize, text: &str) -> Result<Option<Command>> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = split_token(text);
        let command = match word.to_ascii_lowercase().as_str() {
            "put" => {
                let (key, value) = split_token(rest);
                let key = parse_key(line, "put", key)?;
                if value.is_empty() {
                    return Err(parse_error(line, format!("'put {}' needs a value", key)));
                }
                Command::Put {
                    key,
                    value: value.to_string(),
                }
            }
            "get" => {
                let (target, tail) = split_token(rest);
                expect_end(line, "get", tail)?;
                if target.is_empty() {
                    return Err(parse_error(line, "'get' needs a key"));
                }
                let caps = target_pattern()
                    .captures(target)
                    .ok_or_else(|| parse_error(line, format!("invalid get target '{}'", target)))?;
                let version = caps
                    .name("version")
                    .map(|m| parse_version(line, m.as_str()))
                    .transpose()?;
                Command::Get {
                    key: caps["key"].to_string(),
                    version,
                }
            }
            "delete" | "del" => {
                let (key, tail) = split_token(rest);
                expect_end(line, "delete", tail)?;
                Command::Delete {
                    key: parse_key(line, "delete", key)?,
                }
            }
            "history" => {
                let (key, tail) = split_token(rest);
                expect_end(line, "history", tail)?;
                Command::History {
                    key: parse_key(line, "history", key)?,
                }
            }
            "version" => {
                expect_end(line, "version", rest)?;
                Command::Version
            }
            "clear" => {
                expect_end(line, "clear", rest)?;
                Command::Clear
            }
            "keys" => {
                expect_end(line, "keys", rest)?;
                Command::Keys
            }
            "snapshot" => {
                let version = if rest.is_empty() {
                    None
                } else {
                    let caps = version_pattern().captures(rest).ok_or_else(|| {
                        parse_error(line, format!("expected '@<version>', got '{}'", rest))
                    })?;
                    Some(parse_version(line, &caps["version"])?)
                };
                Command::Snapshot { version }
            }
            other => return Err(parse_error(line, format!("unknown command '{}'", other))),
        };

        Ok(Some(command))
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Put { .. } | Command::Delete { .. } | Command::Clear
        )
    }

    /// Runs the commands any [`VersionedMap`] can answer. `history`, `snapshot` and `keys`
    /// need the concrete map and yield `None`.
    pub fn apply_versioned<M>(&self, map: &M) -> Option<CommandOutput>
    where
        M: VersionedMap<String, String> + ?Sized,
    {
        let output = match self {
            Command::Put { key, value } => CommandOutput::Version {
                version: map.put(key.clone(), value.clone()),
            },
            Command::Get { key, version } => {
                let value = match version {
                    Some(version) => map.get_by_version(key, *version),
                    None => map.get(key),
                };
                CommandOutput::Value {
                    key: key.clone(),
                    version: *version,
                    value,
                }
            }
            Command::Delete { key } => CommandOutput::Version {
                version: map.delete(key),
            },
            Command::Version => CommandOutput::Version {
                version: map.current_version(),
            },
            Command::Clear => {
                map.clear();
                CommandOutput::Cleared
            }
            Command::History { .. } | Command::Snapshot { .. } | Command::Keys => return None,
        };
        Some(output)
    }

    pub fn apply(&self, map: &ConcurrentVersionedMap<String, String>) -> CommandOutput {
        if let Some(output) = self.apply_versioned(map) {
            return output;
        }

        match self {
            Command::History { key } => CommandOutput::History {
                key: key.clone(),
                elements: map.history(key),
            },
            Command::Snapshot { version } => CommandOutput::Snapshot {
                snapshot: match version {
                    Some(version) => map.snapshot_at(*version),
                    None => map.snapshot(),
                },
            },
            _ => {
                let mut keys = map.keys();
                keys.sort();
                CommandOutput::Keys { keys }
            }
        }
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Version { version } => write!(f, "{}", version),
            CommandOutput::Value { value, .. } => match value {
                Some(value) => write!(f, "{}", value),
                None => write!(f, "(none)"),
            },
            CommandOutput::Cleared => write!(f, "cleared"),
            CommandOutput::History { key, elements } => {
                if elements.is_empty() {
                    return write!(f, "{}: (no history)", key);
                }
                let lines: Vec<String> = elements
                    .iter()
                    .map(|e| {
                        format!(
                            "v{}\t{}\t{}",
                            e.version,
                            e.value.as_deref().unwrap_or("<deleted>"),
                            e.recorded_at.to_rfc3339()
                        )
                    })
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            CommandOutput::Snapshot { snapshot } => {
                let mut entries: Vec<(&String, &String)> = snapshot.iter().collect();
                entries.sort();
                write!(f, "@{}", snapshot.version())?;
                for (key, value) in entries {
                    write!(f, "\n{}={}", key, value)?;
                }
                Ok(())
            }
            CommandOutput::Keys { keys } => {
                if keys.is_empty() {
                    write!(f, "(empty)")
                } else {
                    write!(f, "{}", keys.join("\n"))
                }
            }
        }
    }
}
