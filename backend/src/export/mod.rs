//! Flat tables for download.
//!
//! Each report view becomes an [`ExportTable`] of strings that any writer can
//! serialize; [`write_csv`] covers the CSV case.
//!
//! | table           | rows                                  |
//! |-----------------|---------------------------------------|
//! | `filtered_data` | surviving records, ISO dates          |
//! | `data_table`    | coupon x `%d-%b` date columns         |
//! | `pivot_table`   | store x coupon with TOTAL row/column  |
//! | `daily_trend`   | aggregated points, ISO dates          |
//! | `summary`       | metric / value pairs                  |

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ColumnNames;
use crate::models::{AggregatedPoint, Record};
use crate::transform::pipeline::Report;
use crate::transform::pivot::{DateCouponMatrix, StoreCouponMatrix, TOTAL};
use crate::transform::summary::Summary;

const ISO_DATE: &str = "%Y-%m-%d";

/// A named table of pre-formatted cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { name: name.to_string(), headers, rows }
    }

    /// `<name>.csv`
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }
}

pub fn filtered_data(records: &[Record], columns: &ColumnNames) -> ExportTable {
    let headers = columns.all().iter().map(|c| c.to_string()).collect();
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.store_code.clone(),
                r.store_name.clone(),
                r.coupon_name.clone(),
                r.sale_date.format(ISO_DATE).to_string(),
                r.quantity.to_string(),
            ]
        })
        .collect();
    ExportTable::new("filtered_data", headers, rows)
}

pub fn data_table(matrix: &DateCouponMatrix, columns: &ColumnNames) -> ExportTable {
    let headers = std::iter::once(columns.coupon_name.clone())
        .chain(matrix.column_labels())
        .collect();
    let rows = matrix
        .coupons
        .iter()
        .zip(&matrix.cells)
        .map(|(coupon, cells)| {
            std::iter::once(coupon.clone())
                .chain(cells.iter().map(u64::to_string))
                .collect()
        })
        .collect();
    ExportTable::new("data_table", headers, rows)
}

pub fn pivot_table(matrix: &StoreCouponMatrix, columns: &ColumnNames) -> ExportTable {
    let headers = if matrix.is_empty() {
        Vec::new()
    } else {
        [columns.store_code.clone(), columns.store_name.clone()]
            .into_iter()
            .chain(matrix.columns())
            .collect()
    };
    let rows = matrix
        .all_rows()
        .map(|row| {
            [row.store_code.clone(), row.store_name.clone()]
                .into_iter()
                .chain(row.cells.iter().map(u64::to_string))
                .chain(std::iter::once(row.total.to_string()))
                .collect()
        })
        .collect();
    ExportTable::new("pivot_table", headers, rows)
}

pub fn daily_trend(points: &[AggregatedPoint], columns: &ColumnNames) -> ExportTable {
    let headers = vec![
        columns.sale_date.clone(),
        columns.coupon_name.clone(),
        columns.quantity.clone(),
    ];
    let rows = points
        .iter()
        .map(|p| {
            vec![
                p.date.format(ISO_DATE).to_string(),
                p.coupon_name.clone(),
                p.total_quantity.to_string(),
            ]
        })
        .collect();
    ExportTable::new("daily_trend", headers, rows)
}

pub fn summary(summary: &Summary) -> ExportTable {
    let (start, end) = summary
        .date_range
        .map(|(s, e)| (s.format(ISO_DATE).to_string(), e.format(ISO_DATE).to_string()))
        .unwrap_or_default();
    let pairs = [
        ("Total Records", summary.total_records.to_string()),
        ("Total Quantity", summary.total_quantity.to_string()),
        ("Distinct Stores", summary.distinct_stores.to_string()),
        ("Distinct Coupons", summary.distinct_coupons.to_string()),
        ("Date Start", start),
        ("Date End", end),
        ("Share Of Source (%)", format!("{:.1}", summary.share_of_source)),
    ];
    let rows = pairs
        .into_iter()
        .map(|(metric, value)| vec![metric.to_string(), value])
        .collect();
    ExportTable::new("summary", vec!["Metric".into(), "Value".into()], rows)
}

/// All five tables for a report.
pub fn report_tables(report: &Report, columns: &ColumnNames) -> Vec<ExportTable> {
    vec![
        filtered_data(&report.filtered, columns),
        data_table(&report.date_matrix, columns),
        pivot_table(&report.store_matrix, columns),
        daily_trend(&report.daily, columns),
        summary(&report.summary),
    ]
}

/// Serialize one table as CSV. An empty table writes nothing at all.
pub fn write_csv<W: io::Write>(table: &ExportTable, writer: W) -> io::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    if !table.headers.is_empty() {
        csv_writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()
}

/// Write every table to `<dir>/<name>.csv`, creating `dir` if needed.
pub fn write_all(tables: &[ExportTable], dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(table.file_name());
        write_csv(table, fs::File::create(&path)?)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{aggregate, date_coupon_matrix, store_coupon_matrix};
    use chrono::NaiveDate;

    fn records() -> Vec<Record> {
        let date = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        vec![
            Record::new("S1", "Store1", "TM", date(1), 5),
            Record::new("S1", "Store1", "TM", date(2), 3),
            Record::new("S2", "Store2", "NR", date(1), 10),
        ]
    }

    fn to_csv(table: &ExportTable) -> String {
        let mut buf = Vec::new();
        write_csv(table, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_filtered_data_uses_iso_dates() {
        let table = filtered_data(&records(), &ColumnNames::default());
        assert_eq!(table.headers, vec!["StrCd", "StrNm", "CpnNm", "SaleDy", "Qty"]);
        assert_eq!(table.rows[0], vec!["S1", "Store1", "TM", "2024-01-01", "5"]);
    }

    #[test]
    fn test_data_table_csv() {
        let matrix = date_coupon_matrix(&aggregate(&records()));
        let csv = to_csv(&data_table(&matrix, &ColumnNames::default()));
        assert_eq!(csv, "CpnNm,01-Jan,02-Jan\nNR,10,0\nTM,5,3\n");
    }

    #[test]
    fn test_pivot_table_has_total_row_and_column() {
        let matrix = store_coupon_matrix(&records());
        let table = pivot_table(&matrix, &ColumnNames::default());
        assert_eq!(table.headers, vec!["StrCd", "StrNm", "NR", "TM", "TOTAL"]);
        assert_eq!(table.rows.last().unwrap(), &vec![TOTAL, "", "10", "8", "18"]);
    }

    #[test]
    fn test_empty_tables_write_nothing() {
        let table = pivot_table(&store_coupon_matrix(&[]), &ColumnNames::default());
        assert!(table.rows.is_empty());
        assert_eq!(to_csv(&table), "");
    }

    #[test]
    fn test_summary_table() {
        let table = summary(&Summary::compute(&records(), 3));
        assert_eq!(table.rows[1], vec!["Total Quantity", "18"]);
        assert_eq!(table.rows[4], vec!["Date Start", "2024-01-01"]);
        assert_eq!(table.rows[6], vec!["Share Of Source (%)", "100.0"]);
    }

    #[test]
    fn test_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let tables = vec![filtered_data(&records(), &ColumnNames::default())];
        let paths = write_all(&tables, &dir.path().join("out")).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("filtered_data.csv"));
        let content = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(content.starts_with("StrCd,StrNm,CpnNm,SaleDy,Qty\n"));
    }
}
