//! Configuration errors raised while building extractors, rankers and catalogs.
//!
//! These are the only errors the aggregation core produces. Data-shape
//! problems in records or snapshots never surface as errors.

use thiserror::Error;

/// A programming error in how an aggregator or catalog was declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field spec declared no key fields.
    #[error("field spec '{category}' declares no key fields")]
    EmptyKey { category: String },

    /// A key, secondary or filter path was empty or contained an empty segment.
    #[error("field spec '{category}' has an empty path segment in '{label}'")]
    EmptyPath { category: String, label: String },

    /// A ranker was built without any tie columns.
    #[error("at least one tie column is required")]
    NoTieColumns,

    /// A tie column name does not match any aggregated column.
    #[error("unknown tie column '{0}' (expected one of: shaves, unique_users)")]
    UnknownColumn(String),

    /// The same tie column was declared twice.
    #[error("tie column '{0}' declared more than once")]
    DuplicateColumn(String),

    /// A catalog selection named a category that is not registered.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// Two aggregators in one catalog share a category name.
    #[error("category '{0}' registered more than once")]
    DuplicateCategory(String),
}
