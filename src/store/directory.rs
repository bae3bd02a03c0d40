use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::{RecordSource, SnapshotProvider};
use crate::analyzers::types::{PeriodReport, Snapshot};
use crate::parser::{gunzip, parse_records, parse_snapshot};
use crate::record::RawRecord;

/// File layout:
///
/// ```text
/// {root}/enriched/{period}.json        record batches (or .json.gz)
/// {root}/aggregated/{period}.json      published reports
/// {root}/aggregated/annual/{year}.json annual reports
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_path(&self, period: &str) -> PathBuf {
        self.root.join("enriched").join(format!("{period}.json"))
    }

    pub fn report_path(&self, period: &str) -> PathBuf {
        self.root.join("aggregated").join(format!("{period}.json"))
    }

    /// Writes `report` to its report path, creating directories as needed.
    pub fn save_report(&self, period: &str, report: &PeriodReport) -> Result<PathBuf> {
        let path = self.report_path(period);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_vec_pretty(report)?;
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Report saved");
        Ok(path)
    }
}

/// Reads `path`, treating a missing file as `None`. Any other I/O error is
/// returned.
fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

impl RecordSource for DirectoryStore {
    fn load_records(&self, period: &str) -> Result<Option<Vec<RawRecord>>> {
        let plain = self.records_path(period);
        if let Some(bytes) = read_if_exists(&plain)? {
            return parse_records(&bytes)
                .with_context(|| format!("failed to parse {}", plain.display()))
                .map(Some);
        }

        let compressed = plain.with_extension("json.gz");
        match read_if_exists(&compressed)? {
            Some(bytes) => parse_records(&gunzip(&bytes)?)
                .with_context(|| format!("failed to parse {}", compressed.display()))
                .map(Some),
            None => Ok(None),
        }
    }
}

impl SnapshotProvider for DirectoryStore {
    fn snapshot(&self, period: &str) -> Result<Option<Snapshot>> {
        let path = self.report_path(period);
        match read_if_exists(&path)? {
            Some(bytes) => parse_snapshot(&bytes)
                .with_context(|| format!("failed to parse {}", path.display()))
                .map(Some),
            None => Ok(None),
        }
    }
}
