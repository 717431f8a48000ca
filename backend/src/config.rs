//! Report configuration.
//!
//! The static lookup tables (coupon name map, keyword aliases) and the layout
//! flags are injected into the pipeline through [`ReportConfig`] instead of
//! living in module-level state, so tests can substitute their own.
//!
//! Configuration is read from a JSON file:
//!
//! ```json
//! {
//!   "nameMap": { "CPN-TM-0424": "TM" },
//!   "keywordAliases": [["tm", "TM"], ["dormant", "Dormant"]],
//!   "layout": { "weekendShading": true, "dynamicTitle": true, "densitySizing": true }
//! }
//! ```
//!
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::transform::normalize::check_name_map;

/// Environment variable pointing at a JSON config file.
pub const CONFIG_ENV: &str = "COUPONSTATS_CONFIG";

/// Environment variable overriding the default server port.
pub const PORT_ENV: &str = "COUPONSTATS_PORT";

pub const DEFAULT_PORT: u16 = 3000;

/// Source column names for the five required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnNames {
    pub store_code: String,
    pub store_name: String,
    pub coupon_name: String,
    pub sale_date: String,
    pub quantity: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            store_code: "StrCd".to_string(),
            store_name: "StrNm".to_string(),
            coupon_name: "CpnNm".to_string(),
            sale_date: "SaleDy".to_string(),
            quantity: "Qty".to_string(),
        }
    }
}

impl ColumnNames {
    /// Names in record field order.
    pub fn all(&self) -> [&str; 5] {
        [
            self.store_code.as_str(),
            self.store_name.as_str(),
            self.coupon_name.as_str(),
            self.sale_date.as_str(),
            self.quantity.as_str(),
        ]
    }
}

/// Presentation switches for the chart layout planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    /// Highlight weekend ticks and emit the weekend annotation.
    pub weekend_shading: bool,
    /// Compose the title from the active criteria instead of the fixed title.
    pub dynamic_title: bool,
    /// Pick font size and rotation from the date count.
    pub density_sizing: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            weekend_shading: true,
            dynamic_title: true,
            density_sizing: true,
        }
    }
}

/// Everything the pipeline needs besides the records and the criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub columns: ColumnNames,
    /// Raw coupon identifier to canonical display name (exact match).
    pub name_map: HashMap<String, String>,
    /// Keyword token to title label, in display order.
    pub keyword_aliases: Vec<(String, String)>,
    /// Keywords used when keyword mode is requested without any.
    pub default_keywords: Vec<String>,
    pub layout: LayoutOptions,
    /// Series colours, assigned to coupons by sorted index.
    pub palette: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            name_map: HashMap::new(),
            keyword_aliases: vec![
                ("tm".to_string(), "TM".to_string()),
                ("new regis".to_string(), "New Member".to_string()),
                ("dormant".to_string(), "Dormant".to_string()),
            ],
            default_keywords: vec![
                "tm".to_string(),
                "new regis".to_string(),
                "dormant".to_string(),
            ],
            layout: LayoutOptions::default(),
            palette: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
                "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl ReportConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load from `COUPONSTATS_CONFIG` (after reading `.env`), or defaults.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Label for a keyword token, if it has one.
    pub fn alias_for(&self, keyword: &str) -> Option<&str> {
        self.keyword_aliases
            .iter()
            .find(|(token, _)| token.eq_ignore_ascii_case(keyword.trim()))
            .map(|(_, label)| label.as_str())
    }

    fn validate(&self) -> ConfigResult<()> {
        if let Some(empty) = self.columns.all().iter().position(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "column name #{} is empty",
                empty + 1
            )));
        }
        if self.palette.is_empty() {
            return Err(ConfigError::Invalid("palette must not be empty".into()));
        }
        check_name_map(&self.name_map).map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

/// Server port from `COUPONSTATS_PORT`, or [`DEFAULT_PORT`].
pub fn port_from_env() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.columns.sale_date, "SaleDy");
        assert_eq!(config.palette.len(), 10);
        assert_eq!(config.alias_for("TM"), Some("TM"));
        assert_eq!(config.alias_for("new regis"), Some("New Member"));
        assert_eq!(config.alias_for("promo"), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReportConfig::from_json(
            r#"{ "nameMap": { "CPN01": "TM" }, "layout": { "weekendShading": false } }"#,
        )
        .unwrap();
        assert_eq!(config.name_map.get("CPN01").map(String::as_str), Some("TM"));
        assert!(!config.layout.weekend_shading);
        assert!(config.layout.dynamic_title);
        assert_eq!(config.columns, ColumnNames::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = ReportConfig::from_json(r#"{ "palette": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ReportConfig::from_json(r#"{ "columns": { "quantity": " " } }"#).unwrap_err();
        assert!(err.to_string().contains("#5"));

        assert!(matches!(
            ReportConfig::from_json("{ not json").unwrap_err(),
            ConfigError::Json(_)
        ));
    }

    #[test]
    fn test_chained_name_map_rejected() {
        let err = ReportConfig::from_json(r#"{ "nameMap": { "A": "B", "B": "C" } }"#).unwrap_err();
        assert!(err.to_string().contains("A -> B"));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "keywordAliases": [["promo", "Promo"]] }}"#).unwrap();

        let config = ReportConfig::from_file(file.path()).unwrap();
        assert_eq!(config.alias_for("promo"), Some("Promo"));
        assert_eq!(config.alias_for("tm"), None);
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let json = ReportConfig::default().to_json().unwrap();
        assert_eq!(ReportConfig::from_json(&json).unwrap(), ReportConfig::default());
    }
}
