pub mod analyzers;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod output;
pub mod parser;
pub mod period;
pub mod record;
pub mod store;

pub use analyzers::aggregate::{PeriodTally, aggregate, tally};
pub use analyzers::annual::{calculate_annual_deltas, rollup};
pub use analyzers::delta::calculate_deltas;
pub use analyzers::rank::{Metric, Ranker, SortOrder, TieColumn, cutoff};
pub use analyzers::tiers::{Tiers, flatten_tiers, identify_tiers};
pub use analyzers::types::{
    AggregatedEntity, AnnualDelta, DeltaRecord, DeltaSymbol, PeriodReport, Ranked, RankedEntity,
    Snapshot, SnapshotEntry,
};
pub use catalog::{Aggregator, Catalog};
pub use error::ConfigError;
pub use extract::{ExtractedFact, Extractor, FieldSpec, GroupKey, NameFormat};
pub use record::RawRecord;
