//! Competition ("1224") ranking over aggregated entities.
//!
//! Entities are sorted by the configured tie columns, then by name for
//! display. A single scan then assigns ranks: an entity whose tie-column
//! values all equal its predecessor's shares that rank, otherwise its rank is
//! its 1-based position in the sorted list. A tie class of `k` members at
//! rank `r` is therefore followed by rank `r + k`.

use std::cmp::Ordering;
use std::str::FromStr;

use tracing::debug;

use crate::analyzers::aggregate::count_u32;
use crate::analyzers::types::{AggregatedEntity, RankedEntity};
use crate::error::ConfigError;

/// A numeric column of [`AggregatedEntity`] that can take part in ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Shaves,
    UniqueUsers,
}

impl Metric {
    fn value(self, entity: &AggregatedEntity) -> u32 {
        match self {
            Metric::Shaves => entity.shaves,
            Metric::UniqueUsers => entity.unique_users,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Shaves => "shaves",
            Metric::UniqueUsers => "unique_users",
        }
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shaves" => Ok(Metric::Shaves),
            "unique_users" => Ok(Metric::UniqueUsers),
            other => Err(ConfigError::UnknownColumn(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// One column used both to sort and to decide ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieColumn {
    pub metric: Metric,
    pub order: SortOrder,
}

impl TieColumn {
    pub const fn descending(metric: Metric) -> Self {
        Self {
            metric,
            order: SortOrder::Descending,
        }
    }

    pub const fn ascending(metric: Metric) -> Self {
        Self {
            metric,
            order: SortOrder::Ascending,
        }
    }

    fn compare(&self, a: &AggregatedEntity, b: &AggregatedEntity) -> Ordering {
        let (a, b) = (self.metric.value(a), self.metric.value(b));
        match self.order {
            SortOrder::Descending => b.cmp(&a),
            SortOrder::Ascending => a.cmp(&b),
        }
    }
}

/// Parses `"shaves"` (descending) or `"shaves:asc"` / `"shaves:desc"`.
impl FromStr for TieColumn {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, order) = match s.trim().split_once(':') {
            Some((name, "asc")) => (name, SortOrder::Ascending),
            Some((name, "desc")) => (name, SortOrder::Descending),
            Some(_) => return Err(ConfigError::UnknownColumn(s.trim().to_string())),
            None => (s, SortOrder::Descending),
        };
        Ok(Self {
            metric: name.parse()?,
            order,
        })
    }
}

/// Assigns competition ranks using an ordered set of tie columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranker {
    columns: Vec<TieColumn>,
}

impl Default for Ranker {
    /// Shaves descending, then unique users descending.
    fn default() -> Self {
        Self {
            columns: vec![
                TieColumn::descending(Metric::Shaves),
                TieColumn::descending(Metric::UniqueUsers),
            ],
        }
    }
}

impl Ranker {
    /// Rejects an empty column list and any metric named twice.
    pub fn new(columns: Vec<TieColumn>) -> Result<Self, ConfigError> {
        if columns.is_empty() {
            return Err(ConfigError::NoTieColumns);
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.metric == column.metric) {
                return Err(ConfigError::DuplicateColumn(column.metric.as_str().to_string()));
            }
        }
        Ok(Self { columns })
    }

    /// Builds a ranker from column names such as `["shaves", "unique_users"]`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let columns = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<TieColumn>, _>>()?;
        Self::new(columns)
    }

    pub fn columns(&self) -> &[TieColumn] {
        &self.columns
    }

    fn compare_ties(&self, a: &AggregatedEntity, b: &AggregatedEntity) -> Ordering {
        self.columns
            .iter()
            .map(|c| c.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Sorts and ranks `entities`.
    ///
    /// Output is in display order: tie columns first, then name ascending,
    /// then group key, so the result does not depend on input order.
    pub fn rank(&self, mut entities: Vec<AggregatedEntity>) -> Vec<RankedEntity> {
        entities.sort_by(|a, b| {
            self.compare_ties(a, b)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.group_key.cmp(&b.group_key))
        });

        let mut ranked: Vec<RankedEntity> = Vec::with_capacity(entities.len());
        let mut tiers = 0usize;

        for (position, entity) in entities.into_iter().enumerate() {
            let rank = match ranked.last() {
                Some(prev) if self.compare_ties(&prev.entity, &entity).is_eq() => prev.rank,
                _ => {
                    tiers += 1;
                    count_u32(position.saturating_add(1))
                }
            };
            ranked.push(RankedEntity { rank, entity });
        }

        debug!(entities = ranked.len(), tiers, "Ranked entities");

        ranked
    }
}

/// Keeps the first `limit` entries of a ranked list plus any further entries
/// tied with the last one kept.
pub fn cutoff(ranked: &[RankedEntity], limit: usize) -> &[RankedEntity] {
    if limit == 0 {
        return &ranked[..0];
    }
    if ranked.len() <= limit {
        return ranked;
    }

    let boundary = ranked[limit - 1].rank;
    let end = ranked[limit..]
        .iter()
        .position(|r| r.rank != boundary)
        .map_or(ranked.len(), |offset| limit + offset);

    &ranked[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::GroupKey;

    fn entity(name: &str, shaves: u32, unique_users: u32) -> AggregatedEntity {
        AggregatedEntity {
            name: name.to_string(),
            group_key: GroupKey {
                values: vec![name.to_string()],
                secondary: None,
            },
            shaves,
            unique_users,
            attributes: Vec::new(),
        }
    }

    fn ranks(ranked: &[RankedEntity]) -> Vec<(&str, u32)> {
        ranked.iter().map(|r| (r.name(), r.rank)).collect()
    }

    #[test]
    fn test_competition_ranking_skips_after_tie() {
        let ranked = Ranker::default().rank(vec![
            entity("D", 2, 1),
            entity("C", 8, 2),
            entity("A", 10, 3),
            entity("B", 8, 2),
        ]);

        assert_eq!(ranks(&ranked), vec![("A", 1), ("B", 2), ("C", 2), ("D", 4)]);
    }

    #[test]
    fn test_all_tied_share_rank_one() {
        let ranked = Ranker::default().rank(vec![
            entity("W", 5, 2),
            entity("X", 5, 2),
            entity("Y", 5, 2),
            entity("Z", 5, 2),
        ]);

        assert!(ranked.iter().all(|r| r.rank == 1));
        assert_eq!(ranked.len(), 4);
    }

    #[test]
    fn test_unique_users_breaks_shave_ties() {
        let ranked = Ranker::default().rank(vec![
            entity("A", 8, 2),
            entity("B", 8, 5),
            entity("C", 8, 2),
        ]);

        assert_eq!(ranks(&ranked), vec![("B", 1), ("A", 2), ("C", 2)]);
    }

    #[test]
    fn test_shaves_only_widens_ties() {
        let ranker = Ranker::from_names(&["shaves"]).unwrap();
        let ranked = ranker.rank(vec![
            entity("A", 8, 2),
            entity("B", 8, 5),
            entity("C", 3, 3),
        ]);

        assert_eq!(ranks(&ranked), vec![("A", 1), ("B", 1), ("C", 3)]);
    }

    #[test]
    fn test_ascending_column() {
        let ranker = Ranker::from_names(&["shaves:asc"]).unwrap();
        let ranked = ranker.rank(vec![entity("A", 8, 2), entity("B", 1, 1)]);

        assert_eq!(ranks(&ranked), vec![("B", 1), ("A", 2)]);
    }

    #[test]
    fn test_rank_is_independent_of_input_order() {
        let input = vec![
            entity("E", 4, 2),
            entity("B", 9, 3),
            entity("C", 4, 2),
            entity("A", 9, 3),
            entity("D", 1, 1),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let ranker = Ranker::default();
        assert_eq!(ranker.rank(input), ranker.rank(reversed));
    }

    #[test]
    fn test_ranks_are_monotonic_and_bounded() {
        let ranked = Ranker::default().rank(vec![
            entity("A", 3, 1),
            entity("B", 3, 1),
            entity("C", 3, 1),
            entity("D", 2, 2),
            entity("E", 2, 1),
            entity("F", 2, 1),
        ]);

        assert_eq!(ranked[0].rank, 1);
        for pair in ranked.windows(2) {
            assert!(pair[0].rank <= pair[1].rank);
        }
        assert!(ranked.iter().all(|r| r.rank as usize <= ranked.len()));
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 1, 1, 4, 5, 5]
        );
    }

    #[test]
    fn test_rank_empty() {
        assert!(Ranker::default().rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_ranker_rejects_bad_columns() {
        assert_eq!(
            Ranker::from_names(&["shaves", "avg_shaves"]).unwrap_err(),
            ConfigError::UnknownColumn("avg_shaves".into())
        );
        assert_eq!(
            Ranker::from_names(&["shaves", "shaves:asc"]).unwrap_err(),
            ConfigError::DuplicateColumn("shaves".into())
        );
        assert_eq!(
            Ranker::from_names::<&str>(&[]).unwrap_err(),
            ConfigError::NoTieColumns
        );
        assert!(Ranker::from_names(&["shaves:sideways"]).is_err());
    }

    #[test]
    fn test_cutoff_keeps_ties_at_boundary() {
        let ranked = Ranker::default().rank(vec![
            entity("A", 10, 3),
            entity("B", 8, 2),
            entity("C", 8, 2),
            entity("D", 8, 2),
            entity("E", 1, 1),
        ]);

        assert_eq!(cutoff(&ranked, 2).len(), 4);
        assert_eq!(cutoff(&ranked, 1).len(), 1);
        assert_eq!(cutoff(&ranked, 4).len(), 4);
        assert_eq!(cutoff(&ranked, 10).len(), 5);
        assert!(cutoff(&ranked, 0).is_empty());
    }
}
