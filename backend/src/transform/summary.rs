//! Key figures for a filtered selection.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{date_bounds, total_quantity, Record};

/// Headline numbers shown above the report tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_records: usize,
    pub total_quantity: u64,
    /// Distinct store names.
    pub distinct_stores: usize,
    pub distinct_coupons: usize,
    /// Dates actually present after filtering.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Filtered records as a percentage of the source records.
    pub share_of_source: f64,
}

impl Summary {
    pub fn compute(filtered: &[Record], source_len: usize) -> Self {
        let share_of_source = if source_len == 0 {
            0.0
        } else {
            filtered.len() as f64 / source_len as f64 * 100.0
        };

        Self {
            total_records: filtered.len(),
            total_quantity: total_quantity(filtered),
            distinct_stores: filtered
                .iter()
                .map(|r| r.store_name.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
            distinct_coupons: filtered
                .iter()
                .map(|r| r.coupon_name.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
            date_range: date_bounds(filtered),
            share_of_source,
        }
    }
}
