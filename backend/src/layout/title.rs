//! Chart title composition.
//!
//! ```text
//! Result Promo TM & Dormant
//! By Coupon Usage (Store1, Store2)
//! ```

use std::collections::BTreeSet;

use crate::config::ReportConfig;
use crate::models::{CouponFilter, FilterCriteria};

pub const STATIC_TITLE: &str = "Result Promo New Member & Dormant";
pub const STATIC_SUBTITLE: &str = "By Coupon Usage (All Stores)";

/// Stores listed by name before switching to `+N more`.
const MAX_LISTED_STORES: usize = 5;

/// Coupons listed by name before switching to a count.
const MAX_LISTED_COUPONS: usize = 3;

/// Title and subtitle for the active criteria.
pub fn compose_title(
    criteria: &FilterCriteria,
    known_stores: &[String],
    config: &ReportConfig,
) -> (String, String) {
    if !config.layout.dynamic_title {
        return (STATIC_TITLE.to_string(), STATIC_SUBTITLE.to_string());
    }
    (
        format!("Result Promo {}", coupon_segment(&criteria.coupons, config)),
        format!(
            "By Coupon Usage ({})",
            store_segment(&criteria.store_set, known_stores)
        ),
    )
}

/// `All Stores`, the sorted names, or the first five and `+N more`.
pub fn store_segment(store_set: &BTreeSet<String>, known_stores: &[String]) -> String {
    let covers_all =
        !known_stores.is_empty() && known_stores.iter().all(|s| store_set.contains(s));
    if store_set.is_empty() || covers_all {
        return "All Stores".to_string();
    }

    let listed: Vec<&str> = store_set
        .iter()
        .take(MAX_LISTED_STORES)
        .map(String::as_str)
        .collect();
    let rest = store_set.len().saturating_sub(MAX_LISTED_STORES);
    if rest == 0 {
        listed.join(", ")
    } else {
        format!("{} +{} more", listed.join(", "), rest)
    }
}

pub fn coupon_segment(filter: &CouponFilter, config: &ReportConfig) -> String {
    match filter {
        CouponFilter::Keywords { keywords } => {
            let matched: Vec<&str> = keywords.iter().filter_map(|k| config.alias_for(k)).collect();
            // alias table order, not keyword order
            let mut labels: Vec<&str> = Vec::new();
            for (_, label) in &config.keyword_aliases {
                if matched.contains(&label.as_str()) && !labels.contains(&label.as_str()) {
                    labels.push(label.as_str());
                }
            }
            if labels.is_empty() {
                "Selected Coupons".to_string()
            } else {
                labels.join(" & ")
            }
        }
        CouponFilter::Explicit { coupons } => match coupons.len() {
            0 => "No Coupons".to_string(),
            n if n <= MAX_LISTED_COUPONS => coupons
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            n => format!("{} Coupons", n),
        },
    }
}
