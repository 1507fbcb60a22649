//! Binary snapshot persistence for mapped record sets.
//!
//! Snapshots carry a format version and a hard record cap; a save keeps
//! the leading records and drops the rest so a snapshot file never grows
//! past what a reload is expected to handle.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransitError};
use crate::record::TransitRecord;

const SNAPSHOT_VERSION: u32 = 1;

/// Upper bound on records a snapshot may hold. Saves truncate to the
/// leading records when the set is larger.
pub const SNAPSHOT_MAX_RECORDS: usize = 10_000;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    version: u32,
    records: Vec<TransitRecord>,
}

fn cache_error(path: &Path, reason: impl std::fmt::Display) -> TransitError {
    TransitError::Cache {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Writes `records` to `path`, truncating to [`SNAPSHOT_MAX_RECORDS`].
/// Returns the number of records actually written.
pub fn save_snapshot(path: &Path, records: &[TransitRecord]) -> Result<usize> {
    let kept = records.len().min(SNAPSHOT_MAX_RECORDS);
    if kept < records.len() {
        warn!(
            "snapshot keeps first {kept} of {} records (cap {SNAPSHOT_MAX_RECORDS})",
            records.len()
        );
    }
    let envelope = SnapshotEnvelope {
        version: SNAPSHOT_VERSION,
        records: records[..kept].to_vec(),
    };
    let bytes = bincode::serde::encode_to_vec(&envelope, bincode::config::standard())
        .map_err(|err| cache_error(path, err))?;
    let file = File::create(path).map_err(|err| cache_error(path, err))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes).map_err(|err| cache_error(path, err))?;
    writer.flush().map_err(|err| cache_error(path, err))?;
    info!("saved snapshot of {kept} records to {}", path.display());
    Ok(kept)
}

/// Reads a snapshot back. Rejects files written by another format version
/// instead of guessing at their layout.
pub fn load_snapshot(path: &Path) -> Result<Vec<TransitRecord>> {
    let bytes = std::fs::read(path).map_err(|err| cache_error(path, err))?;
    let (envelope, _): (SnapshotEnvelope, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|err| cache_error(path, err))?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(TransitError::CacheVersion {
            found: envelope.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    info!(
        "loaded snapshot of {} records from {}",
        envelope.records.len(),
        path.display()
    );
    Ok(envelope.records)
}
