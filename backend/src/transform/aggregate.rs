//! Daily totals per coupon.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{AggregatedPoint, Record};

/// Sum quantities per (date, coupon), sorted by date then coupon name.
///
/// Downstream positional layouts (weekend flags by index, matrix columns) rely
/// on this order.
pub fn aggregate(records: &[Record]) -> Vec<AggregatedPoint> {
    let mut totals: BTreeMap<(NaiveDate, &str), u64> = BTreeMap::new();

    for record in records {
        *totals
            .entry((record.sale_date, record.coupon_name.as_str()))
            .or_insert(0) += record.quantity;
    }

    totals
        .into_iter()
        .map(|((date, coupon), total_quantity)| AggregatedPoint {
            date,
            coupon_name: coupon.to_string(),
            total_quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("S2", "Store2", "TM", date(2), 4),
            Record::new("S1", "Store1", "TM", date(1), 5),
            Record::new("S2", "Store2", "Dormant", date(1), 1),
            Record::new("S1", "Store1", "TM", date(2), 3),
        ]
    }

    #[test]
    fn test_merges_and_sorts() {
        let points = aggregate(&records());
        let keys: Vec<_> = points
            .iter()
            .map(|p| (p.date, p.coupon_name.as_str(), p.total_quantity))
            .collect();

        assert_eq!(
            keys,
            vec![
                (date(1), "Dormant", 1),
                (date(1), "TM", 5),
                (date(2), "TM", 7),
            ]
        );
    }

    #[test]
    fn test_order_independent_of_input_permutation() {
        let mut reversed = records();
        reversed.reverse();
        let mut rotated = records();
        rotated.rotate_left(1);

        let expected = aggregate(&records());
        assert_eq!(aggregate(&reversed), expected);
        assert_eq!(aggregate(&rotated), expected);
        assert!(expected.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }
}
