//! Domain models for the coupon statistics pipeline.
//!
//! - [`Record`] - one coupon redemption row
//! - [`RecordSet`] - immutable, shareable collection of records
//! - [`FilterCriteria`] - store, coupon and date selection
//! - [`CouponFilter`] - keyword or explicit coupon selection
//! - [`AggregatedPoint`] - summed quantity for one (date, coupon) pair

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::Arc;

// =============================================================================
// Record
// =============================================================================

/// A single coupon redemption event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub store_code: String,
    pub store_name: String,
    /// Canonical name once the record set has been normalized.
    pub coupon_name: String,
    pub sale_date: NaiveDate,
    /// At most [`crate::parser::MAX_QUANTITY`] when loaded from an extract.
    pub quantity: u64,
}

impl Record {
    pub fn new(
        store_code: impl Into<String>,
        store_name: impl Into<String>,
        coupon_name: impl Into<String>,
        sale_date: NaiveDate,
        quantity: u64,
    ) -> Self {
        Self {
            store_code: store_code.into(),
            store_name: store_name.into(),
            coupon_name: coupon_name.into(),
            sale_date,
            quantity,
        }
    }
}

// =============================================================================
// Record Set
// =============================================================================

/// Read-only record table produced once per uploaded source.
///
/// Cloning shares the underlying slice. A new upload builds a new set; a set is
/// never mutated in place, so concurrent readers always see a complete table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Arc<[Record]>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records: records.into() }
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Sorted distinct store names.
    pub fn stores(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.store_name.as_str()))
    }

    /// Sorted distinct coupon names.
    pub fn coupons(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.coupon_name.as_str()))
    }

    /// Earliest and latest sale date, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_bounds(&self.records)
    }

    pub fn total_quantity(&self) -> u64 {
        total_quantity(&self.records)
    }
}

impl Deref for RecordSet {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        &self.records
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Earliest and latest sale date across `records`.
pub fn date_bounds(records: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
    let min = records.iter().map(|r| r.sale_date).min()?;
    let max = records.iter().map(|r| r.sale_date).max()?;
    Some((min, max))
}

pub fn total_quantity(records: &[Record]) -> u64 {
    records.iter().map(|r| r.quantity).sum()
}

// =============================================================================
// Filter Criteria
// =============================================================================

/// How coupons are selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum CouponFilter {
    /// Keep coupons whose lower-cased name contains any keyword.
    ///
    /// An empty keyword list keeps every coupon.
    Keywords { keywords: Vec<String> },
    /// Keep coupons named exactly in the set.
    ///
    /// An empty set keeps nothing.
    Explicit { coupons: BTreeSet<String> },
}

impl Default for CouponFilter {
    fn default() -> Self {
        CouponFilter::Keywords { keywords: Vec::new() }
    }
}

/// Store, coupon and date selection applied by the filter engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Store names to keep; empty means no restriction.
    #[serde(default)]
    pub store_set: BTreeSet<String>,
    #[serde(default)]
    pub coupons: CouponFilter,
    /// Inclusive lower bound.
    pub date_start: NaiveDate,
    /// Inclusive upper bound.
    pub date_end: NaiveDate,
}

impl FilterCriteria {
    /// Criteria selecting everything within the given date range.
    pub fn new(date_start: NaiveDate, date_end: NaiveDate) -> Self {
        Self {
            store_set: BTreeSet::new(),
            coupons: CouponFilter::default(),
            date_start,
            date_end,
        }
    }

    /// Criteria spanning the full date range of `records`.
    pub fn covering(records: &[Record]) -> Self {
        match date_bounds(records) {
            Some((start, end)) => Self::new(start, end),
            None => Self::new(NaiveDate::MIN, NaiveDate::MAX),
        }
    }

    pub fn with_stores<I, S>(mut self, stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store_set = stores.into_iter().map(Into::into).collect();
        self
    }

    /// Keyword mode. Tokens are lower-cased and trimmed; blank tokens are dropped.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.coupons = CouponFilter::Keywords { keywords };
        self
    }

    /// Explicit mode.
    pub fn with_coupons<I, S>(mut self, coupons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.coupons = CouponFilter::Explicit {
            coupons: coupons.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn with_dates(mut self, date_start: NaiveDate, date_end: NaiveDate) -> Self {
        self.date_start = date_start;
        self.date_end = date_end;
        self
    }
}

/// Split comma-separated keyword input into lower-cased tokens.
///
/// `"TM, new regis,,dormant "` gives `["tm", "new regis", "dormant"]`.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

// =============================================================================
// Aggregated Point
// =============================================================================

/// Summed quantity for one (date, coupon) pair.
///
/// Field order gives the derived `Ord` its (date, coupon) ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    pub date: NaiveDate,
    pub coupon_name: String,
    pub total_quantity: u64,
}

// =============================================================================
// Tests
// =============================================================================
