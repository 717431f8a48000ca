//! Canonical coupon names.
//!
//! Raw coupon identifiers are rewritten once at load through an exact-match
//! lookup; anything not in the map keeps its name.

use std::collections::HashMap;

use crate::models::Record;

/// Canonical display name for a raw coupon identifier.
pub fn canonical_name<'a>(raw: &'a str, name_map: &'a HashMap<String, String>) -> &'a str {
    name_map.get(raw).map(String::as_str).unwrap_or(raw)
}

/// Copy of `records` with every coupon name replaced by its canonical name.
pub fn normalize(records: &[Record], name_map: &HashMap<String, String>) -> Vec<Record> {
    records
        .iter()
        .map(|record| Record {
            coupon_name: canonical_name(&record.coupon_name, name_map).to_string(),
            ..record.clone()
        })
        .collect()
}

/// Check that applying the map twice gives the same names as applying it once.
///
/// A canonical name that is itself a key pointing elsewhere (`A -> B`,
/// `B -> C`) would make normalization depend on how often it ran.
pub fn check_name_map(name_map: &HashMap<String, String>) -> Result<(), String> {
    let mut chained: Vec<_> = name_map
        .iter()
        .filter(|(_, canonical)| {
            name_map
                .get(canonical.as_str())
                .is_some_and(|next| next != *canonical)
        })
        .map(|(raw, canonical)| format!("{} -> {}", raw, canonical))
        .collect();

    if chained.is_empty() {
        return Ok(());
    }
    chained.sort();
    Err(format!(
        "name map entries map onto other raw names: {}",
        chained.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(coupon: &str) -> Record {
        Record::new("S1", "Store1", coupon, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1)
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mapped_and_unmapped_names() {
        let name_map = map(&[("CPN-TM-01", "TM")]);
        let out = normalize(&[record("CPN-TM-01"), record("Dormant 10K")], &name_map);

        assert_eq!(out[0].coupon_name, "TM");
        assert_eq!(out[1].coupon_name, "Dormant 10K");
    }

    #[test]
    fn test_exact_match_only() {
        let name_map = map(&[("CPN-TM-01", "TM")]);
        let out = normalize(&[record("cpn-tm-01"), record("CPN-TM-01 ")], &name_map);

        assert_eq!(out[0].coupon_name, "cpn-tm-01");
        assert_eq!(out[1].coupon_name, "CPN-TM-01 ");
    }

    #[test]
    fn test_input_untouched_and_idempotent() {
        let name_map = map(&[("A", "Alpha"), ("Alpha", "Alpha"), ("B", "Beta")]);
        let input = vec![record("A"), record("B"), record("C")];

        let once = normalize(&input, &name_map);
        let twice = normalize(&once, &name_map);

        assert_eq!(input[0].coupon_name, "A");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_chained_map_rejected() {
        assert!(check_name_map(&map(&[("A", "B"), ("C", "C")])).is_ok());

        let err = check_name_map(&map(&[("A", "B"), ("B", "C")])).unwrap_err();
        assert!(err.contains("A -> B"));
    }
}
