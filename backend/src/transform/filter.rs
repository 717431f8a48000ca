//! Store, coupon and date predicates.
//!
//! The three predicates are independent and combine with AND. The output keeps
//! input order.
//!
//! Empty selections are deliberately asymmetric:
//! - an empty store set applies no store restriction;
//! - an empty keyword list matches every coupon;
//! - an empty explicit coupon set matches no coupon.

use crate::models::{CouponFilter, FilterCriteria, Record};

/// Records satisfying every predicate in `criteria`.
pub fn filter(records: &[Record], criteria: &FilterCriteria) -> Vec<Record> {
    let coupons = CouponPredicate::new(&criteria.coupons);

    records
        .iter()
        .filter(|r| store_matches(r, criteria))
        .filter(|r| coupons.matches(&r.coupon_name))
        .filter(|r| date_matches(r, criteria))
        .cloned()
        .collect()
}

fn store_matches(record: &Record, criteria: &FilterCriteria) -> bool {
    criteria.store_set.is_empty() || criteria.store_set.contains(&record.store_name)
}

fn date_matches(record: &Record, criteria: &FilterCriteria) -> bool {
    criteria.date_start <= record.sale_date && record.sale_date <= criteria.date_end
}

/// Coupon predicate with keywords lower-cased once per filter run.
enum CouponPredicate<'a> {
    AnyKeyword(Vec<String>),
    Named(&'a std::collections::BTreeSet<String>),
}

impl<'a> CouponPredicate<'a> {
    fn new(filter: &'a CouponFilter) -> Self {
        match filter {
            CouponFilter::Keywords { keywords } => {
                CouponPredicate::AnyKeyword(keywords.iter().map(|k| k.to_lowercase()).collect())
            }
            CouponFilter::Explicit { coupons } => CouponPredicate::Named(coupons),
        }
    }

    fn matches(&self, coupon_name: &str) -> bool {
        match self {
            CouponPredicate::AnyKeyword(keywords) => {
                if keywords.is_empty() {
                    return true;
                }
                let name = coupon_name.to_lowercase();
                keywords.iter().any(|k| name.contains(k.as_str()))
            }
            CouponPredicate::Named(coupons) => coupons.contains(coupon_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("S1", "Store1", "TM Voucher", date(1), 5),
            Record::new("S2", "Store2", "New Regis 50K", date(2), 7),
            Record::new("S1", "Store1", "Dormant", date(3), 2),
            Record::new("S3", "Store3", "Birthday", date(4), 1),
        ]
    }

    fn all_dates() -> FilterCriteria {
        FilterCriteria::new(date(1), date(31))
    }

    fn names(out: &[Record]) -> Vec<&str> {
        out.iter().map(|r| r.coupon_name.as_str()).collect()
    }

    #[test]
    fn test_empty_store_set_means_no_restriction() {
        let criteria = all_dates().with_stores(Vec::<String>::new());
        assert_eq!(filter(&records(), &criteria), records());
    }

    #[test]
    fn test_store_set_restricts_by_name() {
        let criteria = all_dates().with_stores(["Store1"]);
        assert_eq!(names(&filter(&records(), &criteria)), vec!["TM Voucher", "Dormant"]);
    }

    #[test]
    fn test_keywords_substring_or_case_insensitive() {
        let criteria = all_dates().with_keywords(["tm", "NEW REGIS"]);
        assert_eq!(names(&filter(&records(), &criteria)), vec!["TM Voucher", "New Regis 50K"]);

        // substring, not whole word
        let criteria = all_dates().with_keywords(["orm"]);
        assert_eq!(names(&filter(&records(), &criteria)), vec!["Dormant"]);
    }

    #[test]
    fn test_empty_keywords_match_everything() {
        let criteria = all_dates().with_keywords(Vec::<String>::new());
        assert_eq!(filter(&records(), &criteria).len(), 4);
    }

    #[test]
    fn test_explicit_coupons() {
        let criteria = all_dates().with_coupons(["Birthday", "Dormant"]);
        assert_eq!(names(&filter(&records(), &criteria)), vec!["Dormant", "Birthday"]);
    }

    #[test]
    fn test_empty_explicit_set_matches_nothing() {
        let criteria = all_dates().with_coupons(Vec::<String>::new());
        assert!(filter(&records(), &criteria).is_empty());
    }

    #[test]
    fn test_date_bounds_inclusive() {
        let criteria = FilterCriteria::new(date(2), date(3));
        assert_eq!(names(&filter(&records(), &criteria)), vec!["New Regis 50K", "Dormant"]);

        let inverted = FilterCriteria::new(date(3), date(2));
        assert!(filter(&records(), &inverted).is_empty());
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let criteria = FilterCriteria::new(date(1), date(2))
            .with_stores(["Store1", "Store2"])
            .with_keywords(["tm", "dormant"]);
        assert_eq!(names(&filter(&records(), &criteria)), vec!["TM Voucher"]);
    }
}
