//! League-table computation.
//!
//! Records are tallied per catalog table, grouped into entities, given
//! competition ranks, regrouped into tiers, and compared against earlier
//! rankings to produce rank deltas.

pub mod aggregate;
pub mod annual;
pub mod delta;
pub mod rank;
pub mod report;
pub mod tiers;
pub mod types;
