//! Record and snapshot storage collaborators.
//!
//! [`RecordSource`] supplies the raw records for one period.
//! [`SnapshotProvider`] supplies a previously published ranking.
//! [`DirectoryStore`] implements both over a local data directory.

mod directory;

pub use directory::DirectoryStore;

use anyhow::Result;

use crate::analyzers::types::Snapshot;
use crate::record::RawRecord;

/// Loads the enriched record batch for a period such as `2025-05`.
pub trait RecordSource: Send + Sync {
    /// Returns `Ok(None)` when no batch exists for `period`.
    fn load_records(&self, period: &str) -> Result<Option<Vec<RawRecord>>>;
}

/// Loads the published ranking for a period such as `2025-04` or `annual/2024`.
pub trait SnapshotProvider: Send + Sync {
    /// Returns `Ok(None)` when nothing was published for `period`.
    fn snapshot(&self, period: &str) -> Result<Option<Snapshot>>;
}
