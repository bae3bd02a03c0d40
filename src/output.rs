//! Output formatting and persistence for league tables.
//!
//! Supports pretty-printing, JSON logging, CSV export and markdown rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use tracing::{debug, info};

use crate::analyzers::rank::cutoff;
use crate::analyzers::report::ReportDeltas;
use crate::analyzers::types::{AnnualDelta, DeltaRecord, DeltaSymbol, PeriodReport, RankedEntity};

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &PeriodReport) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &PeriodReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Logs one line per delta record.
pub fn print_deltas(category: &str, deltas: &[DeltaRecord]) {
    for d in deltas {
        info!(
            category,
            name = %d.name,
            rank = d.current_rank,
            previous_rank = ?d.previous_rank,
            delta = %d.symbol,
            "Rank change"
        );
    }
}

/// Writes one league table as CSV: `rank,name,shaves,unique_users` followed
/// by the attribute columns.
pub fn write_table_csv(path: &Path, ranked: &[RankedEntity]) -> Result<()> {
    let mut writer =
        Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec!["rank", "name", "shaves", "unique_users"];
    if let Some(first) = ranked.first() {
        header.extend(first.entity.attributes.iter().map(|a| a.label.as_str()));
    }
    writer.write_record(&header)?;

    for r in ranked {
        let mut row = vec![
            r.rank.to_string(),
            r.entity.name.clone(),
            r.entity.shaves.to_string(),
            r.entity.unique_users.to_string(),
        ];
        row.extend(r.entity.attributes.iter().map(|a| a.value.clone()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows = ranked.len(), "CSV table written");
    Ok(())
}

/// Writes every table of `report` as `{dir}/{category}.csv`.
pub fn write_report_csvs(dir: &Path, report: &PeriodReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for (category, ranked) in &report.data {
        write_table_csv(&dir.join(format!("{category}.csv")), ranked)?;
    }
    info!(dir = %dir.display(), tables = report.data.len(), "CSV tables written");
    Ok(())
}

/// `razor_formats` -> `Razor Formats`.
fn table_title(category: &str) -> String {
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// One extra markdown column: a header plus `(name, cell)` pairs in the same
/// order as the ranked rows they annotate.
type ExtraColumn = (String, Vec<(String, String)>);

/// Renders a markdown table of the top `limit` entries (ties at the boundary
/// kept), with one extra column per [`ExtraColumn`]. Cells are matched to rows
/// by position; a missing cell or one naming a different entity renders as
/// `n/a`.
fn render_table(
    out: &mut String,
    title: &str,
    ranked: &[RankedEntity],
    extra: &[ExtraColumn],
    limit: usize,
) {
    let _ = writeln!(out, "## {title}\n");

    let shown = cutoff(ranked, limit);
    if shown.is_empty() {
        out.push_str("_No data._\n\n");
        return;
    }

    out.push_str("| Rank | Name | Shaves | Unique Users |");
    for (header, _) in extra {
        let _ = write!(out, " {} |", escape_cell(header));
    }
    out.push_str("\n|-----:|------|-------:|-------------:|");
    for _ in extra {
        out.push_str(":---:|");
    }
    out.push('\n');

    for (i, r) in shown.iter().enumerate() {
        let _ = write!(
            out,
            "| {} | {} | {} | {} |",
            r.rank,
            escape_cell(r.name()),
            r.shaves(),
            r.unique_users()
        );
        for (_, cells) in extra {
            let cell = cells
                .get(i)
                .filter(|(name, _)| name == r.name())
                .map(|(_, cell)| cell.as_str())
                .unwrap_or("n/a");
            let _ = write!(out, " {cell} |");
        }
        out.push('\n');
    }
    out.push('\n');
}

fn report_header(out: &mut String, heading: &str, report: &PeriodReport) {
    let _ = writeln!(out, "# {heading}\n");
    let _ = writeln!(
        out,
        "{} shaves from {} shavers ({} records).\n",
        report.meta.total_shaves, report.meta.unique_shavers, report.meta.record_count
    );
}

/// Renders a monthly report with symbol delta columns per comparison.
pub fn render_report_markdown(report: &PeriodReport, deltas: &ReportDeltas, limit: usize) -> String {
    let mut out = String::new();
    report_header(&mut out, &format!("Shave Report {}", report.period), report);

    for (category, ranked) in &report.data {
        let extra: Vec<ExtraColumn> = deltas
            .get(category)
            .map(|columns| {
                columns
                    .iter()
                    .map(|(label, records)| {
                        let cells = records
                            .iter()
                            .map(|d| (d.name.clone(), d.symbol.to_string()))
                            .collect();
                        (format!("Δ vs {label}"), cells)
                    })
                    .collect()
            })
            .unwrap_or_default();

        render_table(&mut out, &table_title(category), ranked, &extra, limit);
    }

    out
}

/// Signed annual delta text: `+2`, `-1`, `0`, or `n/a` for new entries.
pub fn format_annual_delta(delta: Option<i64>) -> String {
    match delta {
        Some(d) if d > 0 => format!("+{d}"),
        Some(d) => d.to_string(),
        None => DeltaSymbol::New.to_string(),
    }
}

/// Renders an annual report with one signed delta column against `previous_label`.
pub fn render_annual_markdown(
    report: &PeriodReport,
    deltas: &BTreeMap<String, Vec<AnnualDelta>>,
    previous_label: &str,
    limit: usize,
) -> String {
    let mut out = String::new();
    report_header(&mut out, &format!("Annual Shave Report {}", report.period), report);

    for (category, ranked) in &report.data {
        let extra: Vec<ExtraColumn> = deltas
            .get(category)
            .map(|records| {
                let cells = records
                    .iter()
                    .map(|d| (d.name.clone(), format_annual_delta(d.delta)))
                    .collect();
                vec![(format!("Δ vs {previous_label}"), cells)]
            })
            .unwrap_or_default();

        render_table(&mut out, &table_title(category), ranked, &extra, limit);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::report::{SCHEMA_VERSION, compare_report};
    use crate::analyzers::types::{AggregatedEntity, ReportMeta, Snapshot, SnapshotEntry};
    use crate::extract::{Attribute, GroupKey};
    use chrono::Utc;
    use std::env;

    fn ranked(rank: u32, brand: &str, model: &str, shaves: u32) -> RankedEntity {
        RankedEntity {
            rank,
            entity: AggregatedEntity {
                name: format!("{brand} {model}"),
                group_key: GroupKey {
                    values: vec![brand.into(), model.into()],
                    secondary: None,
                },
                shaves,
                unique_users: 1,
                attributes: vec![
                    Attribute {
                        label: "brand".into(),
                        value: brand.into(),
                    },
                    Attribute {
                        label: "model".into(),
                        value: model.into(),
                    },
                ],
            },
        }
    }

    fn report() -> PeriodReport {
        let mut data = BTreeMap::new();
        data.insert(
            "razors".to_string(),
            vec![
                ranked(1, "Gillette", "Tech", 5),
                ranked(2, "Rockwell", "6S", 3),
                ranked(2, "Karve", "CB", 3),
                ranked(4, "Merkur", "34C", 1),
            ],
        );
        data.insert("razor_formats".to_string(), Vec::new());
        PeriodReport {
            schema_version: SCHEMA_VERSION,
            period: "2025-05".into(),
            generated_at: Utc::now(),
            meta: ReportMeta {
                record_count: 12,
                unique_shavers: 4,
                total_shaves: 12,
            },
            data,
        }
    }

    #[test]
    fn test_print_does_not_panic() {
        let r = report();
        print_pretty(&r);
        print_json(&r).unwrap();
    }

    #[test]
    fn test_table_title() {
        assert_eq!(table_title("razor_formats"), "Razor Formats");
        assert_eq!(table_title("users"), "Users");
    }

    #[test]
    fn test_write_table_csv() {
        let path = env::temp_dir().join("sotd_ranker_test_table.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        write_table_csv(&path, &report().data["razors"]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "rank,name,shaves,unique_users,brand,model");
        assert_eq!(lines[1], "1,Gillette Tech,5,1,Gillette,Tech");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_render_report_markdown_with_deltas() {
        let r = report();
        let mut previous = Snapshot::new();
        previous.insert(
            "razors".into(),
            vec![
                SnapshotEntry {
                    name: "Rockwell 6S".into(),
                    rank: 1,
                },
                SnapshotEntry {
                    name: "Gillette Tech".into(),
                    rank: 3,
                },
            ],
        );
        let deltas = compare_report(&r, &[("Apr 2025".into(), previous)]);

        let md = render_report_markdown(&r, &deltas, 2);

        assert!(md.starts_with("# Shave Report 2025-05\n"));
        assert!(md.contains("| Rank | Name | Shaves | Unique Users | Δ vs Apr 2025 |"));
        assert!(md.contains("| 1 | Gillette Tech | 5 | 1 | ↑2 |"));
        assert!(md.contains("| 2 | Rockwell 6S | 3 | 1 | ↓1 |"));
        assert!(md.contains("| 2 | Karve CB | 3 | 1 | n/a |"));
        assert!(!md.contains("Merkur"));
        assert!(md.contains("## Razor Formats\n\n_No data._"));
    }

    #[test]
    fn test_render_annual_markdown() {
        let r = report();
        let mut deltas = BTreeMap::new();
        deltas.insert(
            "razors".to_string(),
            vec![
                AnnualDelta {
                    name: "Gillette Tech".into(),
                    current_rank: 1,
                    previous_rank: Some(1),
                    delta: Some(0),
                },
                AnnualDelta {
                    name: "Rockwell 6S".into(),
                    current_rank: 2,
                    previous_rank: Some(4),
                    delta: Some(2),
                },
            ],
        );

        let md = render_annual_markdown(&r, &deltas, "2024", 10);
        assert!(md.contains("| 1 | Gillette Tech | 5 | 1 | 0 |"));
        assert!(md.contains("| 2 | Rockwell 6S | 3 | 1 | +2 |"));
        assert!(md.contains("| 4 | Merkur 34C | 1 | 1 | n/a |"));
    }

    #[test]
    fn test_format_annual_delta() {
        assert_eq!(format_annual_delta(Some(3)), "+3");
        assert_eq!(format_annual_delta(Some(-2)), "-2");
        assert_eq!(format_annual_delta(Some(0)), "0");
        assert_eq!(format_annual_delta(None), "n/a");
    }
}
