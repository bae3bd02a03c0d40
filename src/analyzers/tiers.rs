use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::types::Ranked;

/// Entities sharing each rank value.
pub type Tiers = BTreeMap<u32, BTreeSet<String>>;

/// Regroups ranked output by rank value.
pub fn identify_tiers<R: Ranked>(ranked: &[R]) -> Tiers {
    let mut tiers = Tiers::new();
    for r in ranked {
        tiers.entry(r.rank()).or_default().insert(r.name().to_string());
    }
    tiers
}

/// Flattens tiers back into a `name -> rank` mapping.
pub fn flatten_tiers(tiers: &Tiers) -> BTreeMap<String, u32> {
    tiers
        .iter()
        .flat_map(|(rank, names)| names.iter().map(move |name| (name.clone(), *rank)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::SnapshotEntry;

    fn entry(name: &str, rank: u32) -> SnapshotEntry {
        SnapshotEntry {
            name: name.to_string(),
            rank,
        }
    }

    #[test]
    fn test_identify_tiers_groups_by_rank() {
        let ranked = vec![entry("A", 1), entry("B", 2), entry("C", 2), entry("D", 4)];
        let tiers = identify_tiers(&ranked);

        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[&1], BTreeSet::from(["A".to_string()]));
        assert_eq!(tiers[&2], BTreeSet::from(["B".to_string(), "C".to_string()]));
        assert_eq!(tiers[&4], BTreeSet::from(["D".to_string()]));
        assert!(!tiers.contains_key(&3));
    }

    #[test]
    fn test_tiers_round_trip() {
        let ranked = vec![entry("A", 1), entry("B", 1), entry("C", 3), entry("D", 4)];
        let flattened = flatten_tiers(&identify_tiers(&ranked));

        let direct: BTreeMap<String, u32> =
            ranked.iter().map(|e| (e.name.clone(), e.rank)).collect();
        assert_eq!(flattened, direct);
    }

    #[test]
    fn test_empty_tiers() {
        assert!(identify_tiers::<SnapshotEntry>(&[]).is_empty());
    }
}
