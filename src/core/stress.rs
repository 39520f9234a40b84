// Concurrent writer check: every returned version must be unique, the versions must form
// a gap-free run, and every write must read back.

use crate::core::{ConcurrentVersionedMap, Version, VersionedMap};
use crate::utils::error::{Result, VersionedMapError};
use crate::utils::validation;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Barrier;

pub const MAX_WRITERS: usize = 4096;
pub const MAX_PUTS_PER_WRITER: usize = 1_000_000;

#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub writers: usize,
    pub puts_per_writer: usize,
    pub total_puts: usize,
    pub start_version: Version,
    pub final_version: Version,
    #[serde(serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

impl StressReport {
    pub fn puts_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_puts as f64 / secs
        } else {
            0.0
        }
    }
}

fn stress_key(writer: usize, op: usize) -> String {
    format!("w{}-k{}", writer, op)
}

fn stress_value(writer: usize, op: usize) -> String {
    format!("{}:{}", writer, op)
}

/// Runs `writers` concurrent tasks, each putting `puts_per_writer` distinct keys.
///
/// The map must not see other writers while this runs, otherwise the version checks
/// will report a gap.
pub async fn run_stress(
    map: Arc<ConcurrentVersionedMap<String, String>>,
    writers: usize,
    puts_per_writer: usize,
) -> Result<StressReport> {
    validation::validate_range("writers", writers, 1, MAX_WRITERS)?;
    validation::validate_range("puts_per_writer", puts_per_writer, 1, MAX_PUTS_PER_WRITER)?;
    let total_puts = writers.checked_mul(puts_per_writer).ok_or_else(|| {
        VersionedMapError::InvalidConfigValueError {
            field: "puts_per_writer".to_string(),
            value: puts_per_writer.to_string(),
            reason: format!("{} writers x {} puts overflows", writers, puts_per_writer),
        }
    })?;

    let start_version = map.current_version();

    tracing::info!(
        writers,
        puts_per_writer,
        start_version,
        "starting concurrent writer check"
    );

    let barrier = Arc::new(Barrier::new(writers));
    let started = Instant::now();

    let mut handles = Vec::with_capacity(writers);
    for writer in 0..writers {
        let map = Arc::clone(&map);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut versions = Vec::with_capacity(puts_per_writer);
            for op in 0..puts_per_writer {
                versions.push(map.put(stress_key(writer, op), stress_value(writer, op)));
                if op % 64 == 63 {
                    tokio::task::yield_now().await;
                }
            }
            versions
        }));
    }

    let mut seen = BTreeSet::new();
    for handle in handles {
        let versions = handle.await.map_err(|e| VersionedMapError::TaskError {
            message: e.to_string(),
        })?;
        for version in versions {
            if !seen.insert(version) {
                return Err(VersionedMapError::ConsistencyError {
                    message: format!("version {} was handed out twice", version),
                });
            }
        }
    }
    let elapsed = started.elapsed();

    verify_versions(&seen, start_version, total_puts)?;

    let final_version = map.current_version();
    let expected_final = start_version + total_puts as Version;
    if final_version != expected_final {
        return Err(VersionedMapError::ConsistencyError {
            message: format!(
                "final version is {}, expected {}",
                final_version, expected_final
            ),
        });
    }

    for writer in 0..writers {
        for op in 0..puts_per_writer {
            let key = stress_key(writer, op);
            let expected = stress_value(writer, op);
            if map.get(&key).as_deref() != Some(expected.as_str()) {
                return Err(VersionedMapError::ConsistencyError {
                    message: format!("key '{}' did not read back '{}'", key, expected),
                });
            }
        }
    }

    let report = StressReport {
        writers,
        puts_per_writer,
        total_puts,
        start_version,
        final_version,
        elapsed,
    };

    tracing::info!(
        total_puts,
        final_version,
        elapsed_ms = elapsed.as_millis() as u64,
        "concurrent writer check passed ({:.0} puts/s)",
        report.puts_per_second()
    );

    Ok(report)
}

/// Checks that `seen` is exactly `start+1 ..= start+total`.
fn verify_versions(seen: &BTreeSet<Version>, start: Version, total: usize) -> Result<()> {
    if seen.len() != total {
        return Err(VersionedMapError::ConsistencyError {
            message: format!("{} versions returned for {} puts", seen.len(), total),
        });
    }

    let expected = (start + 1)..=(start + total as Version);
    if let Some((got, want)) = seen.iter().zip(expected).find(|(got, want)| **got != *want) {
        return Err(VersionedMapError::ConsistencyError {
            message: format!("expected version {} but found {}", want, got),
        });
    }

    Ok(())
}
