//! High-level pipeline API from uploaded extract to report.
//!
//! Two entry points:
//! 1. [`load_dataset`] parses an upload and normalizes coupon names once
//! 2. [`build_report`] filters, aggregates, pivots and plans the chart
//!
//! # Example
//!
//! ```rust,ignore
//! use couponstats::config::ReportConfig;
//! use couponstats::models::FilterCriteria;
//! use couponstats::transform::pipeline::{build_report, load_dataset_file};
//!
//! let config = ReportConfig::default();
//! let table = load_dataset_file("coupons.csv".as_ref(), &config)?;
//! let criteria = FilterCriteria::covering(&table.records).with_keywords(["tm"]);
//! let report = build_report(&table.records, &criteria, &config)?;
//! println!("{} units", report.summary.total_quantity);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::config::ReportConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::layout::{plan_layout, ChartLayout};
use crate::models::{AggregatedPoint, FilterCriteria, Record, RecordSet};
use crate::parser::{load_bytes_auto, load_file_auto, LoadedTable};

use super::aggregate::aggregate;
use super::filter::filter;
use super::normalize::normalize;
use super::pivot::{date_coupon_matrix, store_coupon_matrix, DateCouponMatrix, StoreCouponMatrix};
use super::summary::Summary;

/// Everything derived from one (record set, criteria) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Surviving records, in source order.
    pub filtered: Vec<Record>,
    /// Daily totals per coupon, sorted by (date, coupon).
    pub daily: Vec<AggregatedPoint>,
    pub date_matrix: DateCouponMatrix,
    pub store_matrix: StoreCouponMatrix,
    pub layout: ChartLayout,
    pub summary: Summary,
}

impl Report {
    /// True when the criteria selected no records.
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }
}

/// Load an uploaded extract and apply the name map.
pub fn load_dataset(bytes: &[u8], config: &ReportConfig) -> PipelineResult<LoadedTable> {
    log_info("Reading coupon extract...");
    let table = load_bytes_auto(bytes, &config.columns)?;
    Ok(finish_load(table, config))
}

/// Same as [`load_dataset`] but reads from disk.
pub fn load_dataset_file(path: &Path, config: &ReportConfig) -> PipelineResult<LoadedTable> {
    log_info(format!("Reading {}...", path.display()));
    let table = load_file_auto(path, &config.columns)?;
    Ok(finish_load(table, config))
}

fn finish_load(table: LoadedTable, config: &ReportConfig) -> LoadedTable {
    log_success(format!("Detected format: {}", table.format));
    if let Some(encoding) = &table.encoding {
        log_success(format!("Detected encoding: {}", encoding));
    }
    if let Some(delimiter) = table.delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    log_success(format!("Read {} records", table.records.len()));

    if config.name_map.is_empty() {
        return table;
    }
    let records = RecordSet::new(normalize(&table.records, &config.name_map));
    log_info_indent(
        format!("Normalized coupon names ({} mappings)", config.name_map.len()),
        1,
    );
    LoadedTable { records, ..table }
}

/// Build the full report for `criteria` over an already loaded record set.
///
/// Fails only on criteria that cannot describe a selection (`dateStart`
/// after `dateEnd`). An empty selection is a valid, empty report.
pub fn build_report(
    records: &RecordSet,
    criteria: &FilterCriteria,
    config: &ReportConfig,
) -> PipelineResult<Report> {
    if criteria.date_start > criteria.date_end {
        return Err(PipelineError::InvalidCriteria(format!(
            "date range starts after it ends ({} > {})",
            criteria.date_start, criteria.date_end
        )));
    }

    log_info(format!("Filtering {} records...", records.len()));
    let filtered = filter(records, criteria);
    if filtered.is_empty() {
        log_warning("No records match the selected filters");
    } else {
        log_success(format!("{} records selected", filtered.len()));
    }

    let daily = aggregate(&filtered);
    log_info_indent(format!("{} daily points", daily.len()), 1);

    let date_matrix = date_coupon_matrix(&daily);
    let store_matrix = store_coupon_matrix(&filtered);
    log_info_indent(
        format!(
            "Pivots: {} coupons x {} dates, {} stores",
            date_matrix.coupons.len(),
            date_matrix.dates.len(),
            store_matrix.rows.len()
        ),
        1,
    );

    let layout = plan_layout(&daily, criteria, &records.stores(), config);
    let summary = Summary::compute(&filtered, records.len());
    log_success(format!("Report ready: {}", layout.title));

    Ok(Report {
        filtered,
        daily,
        date_matrix,
        store_matrix,
        layout,
        summary,
    })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
