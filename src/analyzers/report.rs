use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::{info, warn};

use crate::analyzers::aggregate::PeriodTally;
use crate::analyzers::annual::rollup;
use crate::analyzers::delta::calculate_deltas;
use crate::analyzers::types::{DeltaRecord, PeriodReport, ReportMeta, Snapshot};
use crate::catalog::Catalog;
use crate::record::RawRecord;

/// Version of the report JSON layout.
pub const SCHEMA_VERSION: u8 = 1;

/// Delta columns per category: `(comparison label, deltas)`.
pub type ReportDeltas = BTreeMap<String, Vec<(String, Vec<DeltaRecord>)>>;

fn record_authors(records: &[RawRecord]) -> (usize, BTreeSet<String>) {
    let mut shaves = 0;
    let mut authors = BTreeSet::new();
    for author in records.iter().filter_map(RawRecord::author) {
        shaves += 1;
        authors.insert(author);
    }
    (shaves, authors)
}

/// Batch-level counts for a set of records.
pub fn report_meta(records: &[RawRecord]) -> ReportMeta {
    let (total_shaves, authors) = record_authors(records);
    ReportMeta {
        record_count: records.len(),
        unique_shavers: authors.len(),
        total_shaves,
    }
}

/// Ranks every catalog table over one period's records.
#[tracing::instrument(skip(records, catalog), fields(records = records.len(), tables = catalog.len()))]
pub fn build_period_report(period: &str, records: &[RawRecord], catalog: &Catalog) -> PeriodReport {
    let data = catalog
        .iter()
        .map(|aggregator| (aggregator.category().to_string(), aggregator.rank(records)))
        .collect::<BTreeMap<_, _>>();

    let report = PeriodReport {
        schema_version: SCHEMA_VERSION,
        period: period.to_string(),
        generated_at: Utc::now(),
        meta: report_meta(records),
        data,
    };

    info!(
        period,
        shavers = report.meta.unique_shavers,
        shaves = report.meta.total_shaves,
        "Period report built"
    );

    report
}

/// One month's tallies for every catalog table, ready to be merged.
#[derive(Debug, Clone, Default)]
pub struct MonthTallies {
    pub record_count: usize,
    pub total_shaves: usize,
    pub authors: BTreeSet<String>,
    pub tables: BTreeMap<String, PeriodTally>,
}

/// Tallies one month's records against every catalog table.
pub fn tally_month(records: &[RawRecord], catalog: &Catalog) -> MonthTallies {
    let (total_shaves, authors) = record_authors(records);
    MonthTallies {
        record_count: records.len(),
        total_shaves,
        authors,
        tables: catalog
            .iter()
            .map(|a| (a.category().to_string(), a.tally(records)))
            .collect(),
    }
}

/// Merges monthly tallies into a full-year report.
#[tracing::instrument(skip(months, catalog), fields(months = months.len()))]
pub fn build_annual_report(period: &str, months: Vec<MonthTallies>, catalog: &Catalog) -> PeriodReport {
    let mut meta = ReportMeta::default();
    let mut authors = BTreeSet::new();
    let mut per_table: BTreeMap<String, Vec<PeriodTally>> = BTreeMap::new();

    for month in months {
        meta.record_count += month.record_count;
        meta.total_shaves += month.total_shaves;
        authors.extend(month.authors);
        for (category, tally) in month.tables {
            per_table.entry(category).or_default().push(tally);
        }
    }
    meta.unique_shavers = authors.len();

    let data = catalog
        .iter()
        .map(|aggregator| {
            let tallies = per_table.remove(aggregator.category()).unwrap_or_default();
            (
                aggregator.category().to_string(),
                aggregator.rank_tally(rollup(tallies)),
            )
        })
        .collect();

    info!(period, shavers = meta.unique_shavers, shaves = meta.total_shaves, "Annual report built");

    PeriodReport {
        schema_version: SCHEMA_VERSION,
        period: period.to_string(),
        generated_at: Utc::now(),
        meta,
        data,
    }
}

/// Compares every table of `report` against each labelled snapshot.
///
/// A snapshot that lacks a table contributes no column for that table.
pub fn compare_report(report: &PeriodReport, comparisons: &[(String, Snapshot)]) -> ReportDeltas {
    report
        .data
        .iter()
        .map(|(category, ranked)| {
            let columns = comparisons
                .iter()
                .filter_map(|(label, snapshot)| match snapshot.get(category) {
                    Some(previous) => Some((label.clone(), calculate_deltas(ranked, previous))),
                    None => {
                        warn!(category = %category, comparison = %label, "No previous ranking for table");
                        None
                    }
                })
                .collect();
            (category.clone(), columns)
        })
        .collect()
}
