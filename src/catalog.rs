//! Catalog of league tables.
//!
//! Each table is an [`Aggregator`]: a [`FieldSpec`] describing how facts are
//! grouped plus the [`Ranker`] tie columns. [`Catalog::standard`] registers
//! every table published in the monthly and annual reports.

use std::collections::HashSet;

use crate::analyzers::aggregate::{self, PeriodTally};
use crate::analyzers::rank::Ranker;
use crate::analyzers::types::{AggregatedEntity, RankedEntity};
use crate::error::ConfigError;
use crate::extract::{FieldSpec, NameFormat};
use crate::record::RawRecord;

/// A field spec paired with the columns it is ranked on.
#[derive(Debug, Clone)]
pub struct Aggregator {
    spec: FieldSpec,
    ranker: Ranker,
}

impl Aggregator {
    /// Fails if any tie column is not an aggregated column.
    pub fn new<S: AsRef<str>>(spec: FieldSpec, tie_columns: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            spec,
            ranker: Ranker::from_names(tie_columns)?,
        })
    }

    pub fn category(&self) -> &str {
        self.spec.category()
    }

    pub fn tally(&self, records: &[RawRecord]) -> PeriodTally {
        aggregate::tally(records, &self.spec)
    }

    pub fn aggregate(&self, records: &[RawRecord]) -> Vec<AggregatedEntity> {
        aggregate::aggregate(records, &self.spec)
    }

    /// Aggregates and ranks `records` in one pass.
    pub fn rank(&self, records: &[RawRecord]) -> Vec<RankedEntity> {
        self.ranker.rank(self.aggregate(records))
    }

    /// Ranks an already merged tally, e.g. a yearly rollup.
    pub fn rank_tally(&self, tally: PeriodTally) -> Vec<RankedEntity> {
        self.ranker.rank(tally.into_entities(&self.spec))
    }
}

/// An ordered set of aggregators with unique category names.
#[derive(Debug, Clone)]
pub struct Catalog {
    aggregators: Vec<Aggregator>,
}

const DEFAULT_TIES: &[&str] = &["shaves", "unique_users"];

fn knot_size(values: &[String]) -> String {
    let size = values.first().map(String::as_str).unwrap_or_default();
    let size = size.strip_suffix(".0").unwrap_or(size);
    format!("{size}mm")
}

fn razor_blade_combo(values: &[String]) -> String {
    let razor = NameFormat::Joined(" ").format(&values[..2.min(values.len())]);
    let blade = NameFormat::Joined(" ").format(values.get(2..).unwrap_or_default());
    format!("{razor} + {blade}")
}

impl Catalog {
    pub fn new(aggregators: Vec<Aggregator>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for a in &aggregators {
            if !seen.insert(a.category().to_string()) {
                return Err(ConfigError::DuplicateCategory(a.category().to_string()));
            }
        }
        Ok(Self { aggregators })
    }

    /// Every league table in the published reports.
    pub fn standard() -> Result<Self, ConfigError> {
        let ranked = |spec: FieldSpec| Aggregator::new(spec, DEFAULT_TIES);

        let mut aggregators = vec![
            ranked(
                FieldSpec::builder("razors")
                    .key("brand", &["razor", "matched", "brand"])
                    .key("model", &["razor", "matched", "model"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("razor_manufacturers")
                    .key("brand", &["razor", "matched", "brand"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("razor_formats")
                    .key("format", &["razor", "matched", "format"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("blades")
                    .key("brand", &["blade", "matched", "brand"])
                    .key("model", &["blade", "matched", "model"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("blade_manufacturers")
                    .key("brand", &["blade", "matched", "brand"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("brushes")
                    .key("brand", &["brush", "matched", "brand"])
                    .key("model", &["brush", "matched", "model"])
                    .secondary("fiber", &["brush", "matched", "knot", "fiber"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("brush_handle_makers")
                    .key("handle_maker", &["brush", "matched", "handle", "brand"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("brush_knot_makers")
                    .key("knot_maker", &["brush", "matched", "knot", "brand"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("brush_fibers")
                    .key("fiber", &["brush", "matched", "knot", "fiber"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("brush_knot_sizes")
                    .key("knot_size_mm", &["brush", "matched", "knot", "knot_size_mm"])
                    .name_format(NameFormat::Custom(knot_size))
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("soaps")
                    .key("maker", &["soap", "matched", "maker"])
                    .key("scent", &["soap", "matched", "scent"])
                    .name_format(NameFormat::Joined(" - "))
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("soap_makers")
                    .key("maker", &["soap", "matched", "maker"])
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("blackbird_plates")
                    .key("plate", &["razor", "enriched", "plate"])
                    .filter(&["razor", "matched", "brand"], "Blackland")
                    .filter(&["razor", "matched", "model"], "Blackbird")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("christopher_bradley_plates")
                    .key("plate_level", &["razor", "enriched", "plate_level"])
                    .key("plate_type", &["razor", "enriched", "plate_type"])
                    .filter(&["razor", "matched", "brand"], "Karve")
                    .filter(&["razor", "matched", "model"], "Christopher Bradley")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("game_changer_plates")
                    .key("gap", &["razor", "enriched", "gap"])
                    .filter(&["razor", "matched", "brand"], "RazoRock")
                    .filter(&["razor", "matched", "model"], "Game Changer")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("super_speed_tips")
                    .key("super_speed_tip", &["razor", "enriched", "super_speed_tip"])
                    .filter(&["razor", "matched", "brand"], "Gillette")
                    .filter(&["razor", "matched", "model"], "Super Speed")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("straight_widths")
                    .key("width", &["razor", "enriched", "width"])
                    .filter(&["razor", "matched", "format"], "Straight")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("straight_grinds")
                    .key("grind", &["razor", "enriched", "grind"])
                    .filter(&["razor", "matched", "format"], "Straight")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("straight_points")
                    .key("point", &["razor", "enriched", "point"])
                    .filter(&["razor", "matched", "format"], "Straight")
                    .build()?,
            )?,
            ranked(
                FieldSpec::builder("razor_blade_combos")
                    .key("razor_brand", &["razor", "matched", "brand"])
                    .key("razor_model", &["razor", "matched", "model"])
                    .key("blade_brand", &["blade", "matched", "brand"])
                    .key("blade_model", &["blade", "matched", "model"])
                    .name_format(NameFormat::Custom(razor_blade_combo))
                    .build()?,
            )?,
        ];

        aggregators.push(Aggregator::new(
            FieldSpec::builder("users").key("user", &["author"]).build()?,
            &["shaves"],
        )?);

        Self::new(aggregators)
    }

    /// Narrows the catalog to `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, ConfigError> {
        let aggregators = names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownCategory(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(aggregators)
    }

    pub fn get(&self, category: &str) -> Option<&Aggregator> {
        self.aggregators.iter().find(|a| a.category() == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aggregator> {
        self.aggregators.iter()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.aggregators.iter().map(Aggregator::category)
    }

    pub fn len(&self) -> usize {
        self.aggregators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregators.is_empty()
    }
}
