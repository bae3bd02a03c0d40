//! Data types shared by the aggregation, ranking and delta stages.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::extract::{Attribute, GroupKey};

/// One distinct product (or attribute value) with its usage counts.
///
/// `shaves >= unique_users >= 1` for every entity produced by aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedEntity {
    pub name: String,
    pub group_key: GroupKey,
    pub shaves: u32,
    pub unique_users: u32,
    pub attributes: Vec<Attribute>,
}

/// An [`AggregatedEntity`] with its competition rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntity {
    pub rank: u32,
    pub entity: AggregatedEntity,
}

impl RankedEntity {
    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn shaves(&self) -> u32 {
        self.entity.shaves
    }

    pub fn unique_users(&self) -> u32 {
        self.entity.unique_users
    }
}

/// Serialized as a flat map: `rank`, `name`, `shaves`, `unique_users`, then
/// one entry per attribute.
impl Serialize for RankedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attrs = &self.entity.attributes;
        let mut map = serializer.serialize_map(Some(4 + attrs.len()))?;
        map.serialize_entry("rank", &self.rank)?;
        map.serialize_entry("name", &self.entity.name)?;
        map.serialize_entry("shaves", &self.entity.shaves)?;
        map.serialize_entry("unique_users", &self.entity.unique_users)?;
        for attr in attrs {
            map.serialize_entry(&attr.label, &attr.value)?;
        }
        map.end()
    }
}

/// A `{name, rank}` pair from a previously published ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub rank: u32,
}

/// Anything that has a display name and a rank.
pub trait Ranked {
    fn name(&self) -> &str;
    fn rank(&self) -> u32;
}

impl Ranked for RankedEntity {
    fn name(&self) -> &str {
        &self.entity.name
    }

    fn rank(&self) -> u32 {
        self.rank
    }
}

impl Ranked for SnapshotEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn rank(&self) -> u32 {
        self.rank
    }
}

/// A previously published ranking, keyed by category.
pub type Snapshot = BTreeMap<String, Vec<SnapshotEntry>>;

/// Direction of rank movement between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaSymbol {
    Up(u32),
    Down(u32),
    Same,
    New,
}

impl fmt::Display for DeltaSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaSymbol::Up(n) => write!(f, "↑{n}"),
            DeltaSymbol::Down(n) => write!(f, "↓{n}"),
            DeltaSymbol::Same => write!(f, "="),
            DeltaSymbol::New => write!(f, "n/a"),
        }
    }
}

/// Rank movement of one current entity relative to a previous ranking.
///
/// `delta = previous_rank - current_rank`, so positive means the entity moved
/// towards rank 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub name: String,
    pub current_rank: u32,
    pub previous_rank: Option<u32>,
    pub delta: Option<i64>,
    pub symbol: DeltaSymbol,
}

/// Annual rank movement; same arithmetic as [`DeltaRecord`] without a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualDelta {
    pub name: String,
    pub current_rank: u32,
    pub previous_rank: Option<u32>,
    pub delta: Option<i64>,
}

/// Batch-level counts reported alongside the league tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub record_count: usize,
    pub unique_shavers: usize,
    pub total_shaves: usize,
}

/// Every league table for one reporting period, written as JSON.
#[derive(Debug, Serialize)]
pub struct PeriodReport {
    pub schema_version: u8,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub meta: ReportMeta,
    pub data: BTreeMap<String, Vec<RankedEntity>>,
}

impl PeriodReport {
    /// Reduces the report to the `{name, rank}` view used for deltas.
    pub fn to_snapshot(&self) -> Snapshot {
        self.data
            .iter()
            .map(|(category, ranked)| {
                let entries = ranked
                    .iter()
                    .map(|r| SnapshotEntry {
                        name: r.name().to_string(),
                        rank: r.rank,
                    })
                    .collect();
                (category.clone(), entries)
            })
            .collect()
    }
}

/// The part of a report file needed to compare against it.
#[derive(Debug, Deserialize)]
pub struct SnapshotFile {
    pub data: Snapshot,
}
