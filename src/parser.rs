//! Decoding of enriched record batches and published report snapshots.

use std::io::Read;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde_json::Value;
use tracing::debug;

use crate::analyzers::types::{Snapshot, SnapshotFile};
use crate::record::RawRecord;

/// Decodes a JSON record batch.
///
/// Accepts either a bare array of records or an object with the records
/// under `data`. Array entries that are not objects are skipped.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON or hold neither shape.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_slice(bytes).context("record batch is not valid JSON")?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => match fields.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => anyhow::bail!("record batch object has no 'data' array"),
        },
        _ => anyhow::bail!("record batch must be an array or an object with 'data'"),
    };

    let total = entries.len();
    let records: Vec<RawRecord> = entries.into_iter().filter_map(RawRecord::from_value).collect();

    if records.len() < total {
        debug!(skipped = total - records.len(), "Skipped non-object entries");
    }

    Ok(records)
}

/// Inflates gzip-compressed bytes.
pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .context("failed to decompress gzip data")?;
    Ok(out)
}

/// Reads the `{name, rank}` view out of a published report.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let file: SnapshotFile = serde_json::from_slice(bytes).context("invalid report snapshot")?;
    Ok(file.data)
}
