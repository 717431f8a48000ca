//! Cross-tab construction.
//!
//! Two independent builds from the same filtered records:
//!
//! ```text
//! Date x Coupon (data table)         Store x Coupon (store view)
//! ┌────────┬────────┬────────┐       ┌──────┬────────┬────┬────┬───────┐
//! │ CpnNm  │ 01-Jan │ 02-Jan │       │StrCd │ StrNm  │ NR │ TM │ TOTAL │
//! ├────────┼────────┼────────┤       ├──────┼────────┼────┼────┼───────┤
//! │ NR     │     10 │      0 │       │ S1   │ Store1 │  0 │  8 │     8 │
//! │ TM     │      5 │      3 │       │ S2   │ Store2 │ 10 │  0 │    10 │
//! └────────┴────────┴────────┘       │ TOTAL│        │ 10 │  8 │    18 │
//!                                    └──────┴────────┴────┴────┴───────┘
//! ```
//!
//! An empty input gives an empty matrix of either kind (no rows, no columns,
//! no TOTAL row).

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AggregatedPoint, Record};

/// Sentinel store code and column name for totals.
pub const TOTAL: &str = "TOTAL";

/// Column header format for dates, e.g. `01-Jan`.
pub const DATE_LABEL_FORMAT: &str = "%d-%b";

// =============================================================================
// Date x Coupon
// =============================================================================

/// Coupons (rows, sorted) by dates (columns, ascending), cells summed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCouponMatrix {
    pub coupons: Vec<String>,
    pub dates: Vec<NaiveDate>,
    /// `cells[row][col]`, row = coupon, col = date.
    pub cells: Vec<Vec<u64>>,
}

impl DateCouponMatrix {
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// Column labels, e.g. `["01-Jan", "02-Jan"]`.
    pub fn column_labels(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format(DATE_LABEL_FORMAT).to_string())
            .collect()
    }

    pub fn get(&self, coupon: &str, date: NaiveDate) -> Option<u64> {
        let row = self.coupons.iter().position(|c| c == coupon)?;
        let col = self.dates.iter().position(|d| *d == date)?;
        Some(self.cells[row][col])
    }

    /// Sum over all cells.
    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }
}

/// Build the date x coupon matrix from aggregated points.
pub fn date_coupon_matrix(points: &[AggregatedPoint]) -> DateCouponMatrix {
    let coupons: Vec<String> = points
        .iter()
        .map(|p| p.coupon_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect();
    let dates: Vec<NaiveDate> = points
        .iter()
        .map(|p| p.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![0u64; dates.len()]; coupons.len()];
    for point in points {
        // both lookups succeed: the axes were built from these points
        if let (Ok(row), Ok(col)) = (
            coupons.binary_search_by(|c| c.as_str().cmp(&point.coupon_name)),
            dates.binary_search(&point.date),
        ) {
            cells[row][col] += point.total_quantity;
        }
    }

    DateCouponMatrix { coupons, dates, cells }
}

// =============================================================================
// Store x Coupon
// =============================================================================

/// One row of the store view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRow {
    pub store_code: String,
    pub store_name: String,
    /// One cell per coupon column.
    pub cells: Vec<u64>,
    /// Row total across coupon cells.
    pub total: u64,
}

/// Stores by coupons with a TOTAL column and a TOTAL row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCouponMatrix {
    /// Coupon columns (sorted); the TOTAL column is implicit and always last.
    pub coupons: Vec<String>,
    /// Data rows, ordered by (store code, store name).
    pub rows: Vec<StoreRow>,
    /// Column totals with store code `TOTAL` and an empty store name.
    pub total_row: Option<StoreRow>,
}

impl StoreCouponMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Coupon columns followed by `TOTAL`; empty for an empty matrix.
    pub fn columns(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        self.coupons
            .iter()
            .cloned()
            .chain(std::iter::once(TOTAL.to_string()))
            .collect()
    }

    /// Data rows followed by the TOTAL row.
    pub fn all_rows(&self) -> impl Iterator<Item = &StoreRow> {
        self.rows.iter().chain(self.total_row.iter())
    }

    /// Value of the (TOTAL, TOTAL) cell.
    pub fn grand_total(&self) -> u64 {
        self.total_row.as_ref().map(|r| r.total).unwrap_or(0)
    }
}

/// Build the store x coupon matrix directly from filtered records.
pub fn store_coupon_matrix(records: &[Record]) -> StoreCouponMatrix {
    if records.is_empty() {
        return StoreCouponMatrix::default();
    }

    let mut grouped: BTreeMap<(&str, &str), BTreeMap<&str, u64>> = BTreeMap::new();
    for record in records {
        *grouped
            .entry((record.store_code.as_str(), record.store_name.as_str()))
            .or_default()
            .entry(record.coupon_name.as_str())
            .or_insert(0) += record.quantity;
    }

    let coupons: Vec<&str> = records
        .iter()
        .map(|r| r.coupon_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows: Vec<StoreRow> = grouped
        .into_iter()
        .map(|((code, name), by_coupon)| {
            let cells: Vec<u64> = coupons
                .iter()
                .map(|c| by_coupon.get(c).copied().unwrap_or(0))
                .collect();
            StoreRow {
                store_code: code.to_string(),
                store_name: name.to_string(),
                total: cells.iter().sum(),
                cells,
            }
        })
        .collect();

    let column_totals: Vec<u64> = (0..coupons.len())
        .map(|col| rows.iter().map(|r| r.cells[col]).sum())
        .collect();
    let total_row = StoreRow {
        store_code: TOTAL.to_string(),
        store_name: String::new(),
        total: rows.iter().map(|r| r.total).sum(),
        cells: column_totals,
    };

    StoreCouponMatrix {
        coupons: coupons.into_iter().map(String::from).collect(),
        rows,
        total_row: Some(total_row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::aggregate::aggregate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("S1", "Store1", "TM", date(1), 5),
            Record::new("S1", "Store1", "TM", date(2), 3),
            Record::new("S2", "Store2", "NR", date(1), 10),
            Record::new("S2", "Store2", "TM", date(2), 2),
            Record::new("S1", "Store1", "TM", date(2), 1),
        ]
    }

    #[test]
    fn test_date_coupon_matrix_fills_zeros() {
        let matrix = date_coupon_matrix(&aggregate(&records()));

        assert_eq!(matrix.coupons, vec!["NR", "TM"]);
        assert_eq!(matrix.column_labels(), vec!["01-Jan", "02-Jan"]);
        assert_eq!(matrix.cells, vec![vec![10, 0], vec![5, 6]]);
        assert_eq!(matrix.get("TM", date(2)), Some(6));
        assert_eq!(matrix.get("XX", date(2)), None);
    }

    #[test]
    fn test_date_coupon_matrix_conserves_quantity() {
        let recs = records();
        let matrix = date_coupon_matrix(&aggregate(&recs));
        assert_eq!(matrix.total(), recs.iter().map(|r| r.quantity).sum::<u64>());
    }

    #[test]
    fn test_store_matrix_layout() {
        let matrix = store_coupon_matrix(&records());

        assert_eq!(matrix.columns(), vec!["NR", "TM", "TOTAL"]);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].store_code, "S1");
        assert_eq!(matrix.rows[0].cells, vec![0, 9]);
        assert_eq!(matrix.rows[0].total, 9);
        assert_eq!(matrix.rows[1].cells, vec![10, 2]);

        let total = matrix.total_row.as_ref().unwrap();
        assert_eq!(total.store_code, TOTAL);
        assert_eq!(total.store_name, "");
        assert_eq!(total.cells, vec![10, 11]);
        assert_eq!(matrix.grand_total(), 21);
        assert_eq!(matrix.all_rows().last().unwrap().store_code, TOTAL);
    }

    #[test]
    fn test_store_matrix_row_and_column_totals() {
        let matrix = store_coupon_matrix(&records());
        for row in &matrix.rows {
            assert_eq!(row.total, row.cells.iter().sum::<u64>());
        }
        let total = matrix.total_row.as_ref().unwrap();
        for (col, value) in total.cells.iter().enumerate() {
            assert_eq!(*value, matrix.rows.iter().map(|r| r.cells[col]).sum::<u64>());
        }
        assert_eq!(total.total, total.cells.iter().sum::<u64>());
    }

    #[test]
    fn test_same_name_different_codes_are_separate_rows() {
        let recs = vec![
            Record::new("S1", "Mall", "TM", date(1), 1),
            Record::new("S9", "Mall", "TM", date(1), 2),
        ];
        let matrix = store_coupon_matrix(&recs);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.grand_total(), 3);
    }

    #[test]
    fn test_empty_inputs_give_empty_matrices() {
        let dates = date_coupon_matrix(&[]);
        assert!(dates.is_empty());
        assert!(dates.dates.is_empty());
        assert_eq!(dates.total(), 0);

        let stores = store_coupon_matrix(&[]);
        assert!(stores.is_empty());
        assert!(stores.columns().is_empty());
        assert!(stores.total_row.is_none());
        assert_eq!(stores.grand_total(), 0);
    }
}
