use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::analyzers::types::AggregatedEntity;
use crate::extract::{Extractor, GroupKey};
use crate::record::RawRecord;

/// Narrows a count to `u32`, saturating at `u32::MAX`.
pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Shave count and distinct authors for one group key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTally {
    pub shaves: u32,
    pub authors: BTreeSet<String>,
}

/// Facts grouped by key for one extractor over one or more record batches.
///
/// Tallies from separate periods can be merged without losing distinct-user
/// accuracy, which is what the annual rollup relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodTally {
    groups: BTreeMap<GroupKey, GroupTally>,
    dropped: usize,
}

impl PeriodTally {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct group keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Number of records that produced no fact.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupTally> {
        self.groups.get(key)
    }

    fn record(&mut self, key: GroupKey, author: String) {
        let group = self.groups.entry(key).or_default();
        group.shaves = group.shaves.saturating_add(1);
        group.authors.insert(author);
    }

    /// Adds `other` into `self`: shave counts add, author sets union.
    pub fn merge(&mut self, other: PeriodTally) {
        self.dropped += other.dropped;
        for (key, tally) in other.groups {
            let group = self.groups.entry(key).or_default();
            group.shaves = group.shaves.saturating_add(tally.shaves);
            group.authors.extend(tally.authors);
        }
    }

    /// Converts each group into an [`AggregatedEntity`], in group-key order.
    pub fn into_entities<E: Extractor + ?Sized>(self, extractor: &E) -> Vec<AggregatedEntity> {
        self.groups
            .into_iter()
            .map(|(key, tally)| AggregatedEntity {
                name: extractor.entity_name(&key),
                attributes: extractor.attributes(&key),
                shaves: tally.shaves,
                unique_users: count_u32(tally.authors.len()),
                group_key: key,
            })
            .collect()
    }
}

/// Runs `extractor` over every record and groups the resulting facts.
///
/// Records that yield no fact are counted in [`PeriodTally::dropped`] and
/// otherwise ignored.
pub fn tally<E: Extractor + ?Sized>(records: &[RawRecord], extractor: &E) -> PeriodTally {
    let mut tally = PeriodTally::default();

    for record in records {
        match extractor.extract(record) {
            Some(fact) => tally.record(fact.group_key, fact.author),
            None => tally.dropped += 1,
        }
    }

    debug!(
        records = records.len(),
        groups = tally.len(),
        dropped = tally.dropped,
        "Tallied records"
    );

    tally
}

/// Groups the facts `extractor` finds in `records` into one entity per
/// distinct key. Returns an empty list when no record yields a fact.
pub fn aggregate<E: Extractor + ?Sized>(
    records: &[RawRecord],
    extractor: &E,
) -> Vec<AggregatedEntity> {
    tally(records, extractor).into_entities(extractor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldSpec;
    use serde_json::json;

    #[test]
    fn test_count_u32_saturates() {
        assert_eq!(count_u32(7), 7);
        assert_eq!(count_u32(u32::MAX as usize), u32::MAX);
        assert_eq!(count_u32(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_merge_saturates_shave_count() {
        let key = GroupKey {
            values: vec!["Gillette".into(), "Tech".into()],
            secondary: None,
        };
        let mut a = PeriodTally::default();
        a.record(key.clone(), "alice".into());
        a.groups.get_mut(&key).unwrap().shaves = u32::MAX;

        let mut b = PeriodTally::default();
        b.record(key.clone(), "bob".into());
        a.merge(b);

        let group = a.get(&key).unwrap();
        assert_eq!(group.shaves, u32::MAX);
        assert_eq!(group.authors.len(), 2);
    }

    fn razor_spec() -> FieldSpec {
        FieldSpec::builder("razors")
            .key("brand", &["razor", "matched", "brand"])
            .key("model", &["razor", "matched", "model"])
            .build()
            .unwrap()
    }

    fn razor(author: &str, brand: &str, model: &str) -> RawRecord {
        RawRecord::from_value(json!({
            "author": author,
            "razor": { "matched": { "brand": brand, "model": model } }
        }))
        .unwrap()
    }

    #[test]
    fn test_aggregate_counts_shaves_and_unique_users() {
        let records = vec![
            razor("alice", "Gillette", "Tech"),
            razor("alice", "Gillette", "Tech"),
            razor("bob", "Gillette", "Tech"),
            razor("bob", "Rockwell", "6S"),
        ];

        let entities = aggregate(&records, &razor_spec());
        assert_eq!(entities.len(), 2);

        let tech = entities.iter().find(|e| e.name == "Gillette Tech").unwrap();
        assert_eq!(tech.shaves, 3);
        assert_eq!(tech.unique_users, 2);

        let six_s = entities.iter().find(|e| e.name == "Rockwell 6S").unwrap();
        assert_eq!(six_s.shaves, 1);
        assert_eq!(six_s.unique_users, 1);
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate(&[], &razor_spec()).is_empty());

        let no_razor = vec![RawRecord::from_value(json!({ "author": "alice" })).unwrap()];
        let t = tally(&no_razor, &razor_spec());
        assert!(t.is_empty());
        assert_eq!(t.dropped(), 1);
        assert!(t.into_entities(&razor_spec()).is_empty());
    }

    #[test]
    fn test_aggregate_invariants_hold() {
        let records = vec![
            razor("alice", "Gillette", "Tech"),
            razor("bob", "Gillette", "Tech"),
            razor("carol", "Gillette", ""),
            razor("carol", "Gillette", ""),
        ];

        let entities = aggregate(&records, &razor_spec());
        assert_eq!(entities.len(), 2);
        for e in &entities {
            assert!(e.shaves >= e.unique_users);
            assert!(e.unique_users >= 1);
        }
    }

    #[test]
    fn test_merge_unions_authors() {
        let spec = razor_spec();
        let mut january = tally(
            &[razor("alice", "Gillette", "Tech"), razor("bob", "Gillette", "Tech")],
            &spec,
        );
        let february = tally(
            &[razor("alice", "Gillette", "Tech"), razor("carol", "Rockwell", "6S")],
            &spec,
        );

        january.merge(february);

        let entities = january.into_entities(&spec);
        let tech = entities.iter().find(|e| e.name == "Gillette Tech").unwrap();
        assert_eq!(tech.shaves, 3);
        assert_eq!(tech.unique_users, 2);
        assert_eq!(entities.len(), 2);
    }
}
