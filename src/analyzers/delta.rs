//! Period-over-period rank movement.
//!
//! Deltas are plain rank arithmetic. Because ranks are competition ranks, a
//! tie class growing or shrinking shifts the ranks of everything below it,
//! so an entity can move several places without any change in relative
//! order. That is reported as-is.

use std::collections::HashMap;

use crate::analyzers::types::{DeltaRecord, DeltaSymbol, Ranked};

/// Builds a `name -> rank` lookup. When a name appears more than once the
/// first (best-ranked) occurrence wins.
pub(crate) fn rank_lookup<P: Ranked>(previous: &[P]) -> HashMap<&str, u32> {
    let mut lookup = HashMap::with_capacity(previous.len());
    for p in previous {
        lookup.entry(p.name()).or_insert(p.rank());
    }
    lookup
}

/// `previous - current`, positive when the entity moved towards rank 1.
pub(crate) fn rank_delta(previous: u32, current: u32) -> i64 {
    i64::from(previous) - i64::from(current)
}

fn places(delta: i64) -> u32 {
    u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX)
}

impl DeltaSymbol {
    /// Classifies a signed delta; `None` means the entity was not ranked before.
    pub fn from_delta(delta: Option<i64>) -> Self {
        match delta {
            None => DeltaSymbol::New,
            Some(0) => DeltaSymbol::Same,
            Some(d) if d > 0 => DeltaSymbol::Up(places(d)),
            Some(d) => DeltaSymbol::Down(places(d)),
        }
    }
}

/// Compares `current` against `previous` by name.
///
/// One record is produced per current entity, in current order. Entities
/// only present in `previous` are not reported.
pub fn calculate_deltas<C: Ranked, P: Ranked>(current: &[C], previous: &[P]) -> Vec<DeltaRecord> {
    let lookup = rank_lookup(previous);

    current
        .iter()
        .map(|c| {
            let previous_rank = lookup.get(c.name()).copied();
            let delta = previous_rank.map(|p| rank_delta(p, c.rank()));
            DeltaRecord {
                name: c.name().to_string(),
                current_rank: c.rank(),
                previous_rank,
                delta,
                symbol: DeltaSymbol::from_delta(delta),
            }
        })
        .collect()
}
