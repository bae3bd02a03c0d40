use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::analyzers::aggregate::PeriodTally;
use crate::analyzers::delta::{rank_delta, rank_lookup};
use crate::analyzers::types::{AnnualDelta, Ranked};

/// Compares two full-year rankings per category.
///
/// A category present in only one of the two snapshots is skipped; every
/// other category is still computed.
pub fn calculate_annual_deltas<C: Ranked, P: Ranked>(
    current: &BTreeMap<String, Vec<C>>,
    previous: &BTreeMap<String, Vec<P>>,
) -> BTreeMap<String, Vec<AnnualDelta>> {
    let mut result = BTreeMap::new();

    for (category, current_ranked) in current {
        let Some(previous_ranked) = previous.get(category) else {
            warn!(category = %category, "Category missing from previous year, skipping");
            continue;
        };

        let lookup = rank_lookup(previous_ranked);
        let deltas = current_ranked
            .iter()
            .map(|c| {
                let previous_rank = lookup.get(c.name()).copied();
                AnnualDelta {
                    name: c.name().to_string(),
                    current_rank: c.rank(),
                    previous_rank,
                    delta: previous_rank.map(|p| rank_delta(p, c.rank())),
                }
            })
            .collect();

        result.insert(category.clone(), deltas);
    }

    for category in previous.keys().filter(|k| !current.contains_key(*k)) {
        warn!(category = %category, "Category missing from current year, skipping");
    }

    result
}

/// Merges the monthly tallies of one category into a yearly tally.
pub fn rollup(months: impl IntoIterator<Item = PeriodTally>) -> PeriodTally {
    let mut year = PeriodTally::default();
    let mut merged = 0usize;
    for month in months {
        year.merge(month);
        merged += 1;
    }
    debug!(months = merged, groups = year.len(), "Rolled up monthly tallies");
    year
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::tally;
    use crate::analyzers::types::SnapshotEntry;
    use crate::extract::{Extractor, FieldSpec};
    use crate::record::RawRecord;
    use serde_json::json;

    fn entry(name: &str, rank: u32) -> SnapshotEntry {
        SnapshotEntry {
            name: name.to_string(),
            rank,
        }
    }

    fn snapshot(groups: &[(&str, Vec<SnapshotEntry>)]) -> BTreeMap<String, Vec<SnapshotEntry>> {
        groups
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_annual_deltas_per_group() {
        let current = snapshot(&[
            ("blades", vec![entry("Astra SP", 1), entry("Feather", 2)]),
            ("soaps", vec![entry("Declaration B2", 1)]),
        ]);
        let previous = snapshot(&[
            ("blades", vec![entry("Feather", 1), entry("Astra SP", 3)]),
            ("soaps", vec![entry("Declaration B2", 1)]),
        ]);

        let deltas = calculate_annual_deltas(&current, &previous);
        assert_eq!(deltas["blades"][0].delta, Some(2));
        assert_eq!(deltas["blades"][1].delta, Some(-1));
        assert_eq!(deltas["soaps"][0].delta, Some(0));
    }

    #[test]
    fn test_group_missing_from_one_side_is_skipped() {
        let current = snapshot(&[
            ("razors", vec![entry("Gillette Tech", 1)]),
            ("blades", vec![entry("Feather", 1), entry("Personna", 2)]),
        ]);
        let previous = snapshot(&[
            ("blades", vec![entry("Feather", 2)]),
            ("brushes", vec![entry("Semogue 830", 1)]),
        ]);

        let deltas = calculate_annual_deltas(&current, &previous);
        assert!(!deltas.contains_key("razors"));
        assert!(!deltas.contains_key("brushes"));
        assert_eq!(deltas["blades"][0].delta, Some(1));
        assert_eq!(deltas["blades"][1].delta, None);
        assert_eq!(deltas["blades"][1].previous_rank, None);
    }

    #[test]
    fn test_rollup_keeps_unique_users_exact() {
        let spec = FieldSpec::builder("blades")
            .key("brand", &["blade", "matched", "brand"])
            .build()
            .unwrap();
        let blade = |author: &str, brand: &str| {
            RawRecord::from_value(json!({
                "author": author,
                "blade": { "matched": { "brand": brand } }
            }))
            .unwrap()
        };

        let months = vec![
            tally(&[blade("alice", "Feather"), blade("bob", "Feather")], &spec),
            tally(&[blade("alice", "Feather")], &spec),
            tally(&[blade("carol", "Astra")], &spec),
        ];

        let entities = rollup(months).into_entities(&spec);
        let feather = entities.iter().find(|e| e.name == "Feather").unwrap();
        assert_eq!(feather.shaves, 3);
        assert_eq!(feather.unique_users, 2);
        assert_eq!(spec.entity_name(&feather.group_key), "Feather");
    }
}
