//! REST API request and response bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cache::CachedDataset;
use crate::models::FilterCriteria;
use crate::parser::SourceFormat;
use crate::transform::pipeline::Report;

/// Returned after an upload; carries what the UI needs to populate its
/// selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub dataset_id: Uuid,
    /// Always `"ready"`.
    pub status: String,
    /// The same bytes were uploaded before.
    pub cached: bool,
    pub metadata: DatasetMetadata,
    /// Sorted distinct store names.
    pub stores: Vec<String>,
    /// Sorted distinct canonical coupon names.
    pub coupons: Vec<String>,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub format: SourceFormat,
    /// Absent for workbooks.
    pub encoding: Option<String>,
    /// Absent for workbooks.
    pub delimiter: Option<String>,
    pub record_count: usize,
    pub columns: Vec<String>,
}

impl UploadResponse {
    pub fn new(dataset: &CachedDataset, cached: bool) -> Self {
        let table = &dataset.table;
        Self {
            dataset_id: dataset.id,
            status: "ready".to_string(),
            cached,
            metadata: DatasetMetadata {
                format: table.format,
                encoding: table.encoding.clone(),
                delimiter: table.delimiter.map(|d| d.to_string()),
                record_count: table.records.len(),
                columns: table.headers.clone(),
            },
            stores: table.records.stores(),
            coupons: table.records.coupons(),
            date_bounds: table.records.date_bounds(),
        }
    }
}

/// `POST /api/report` body. Without criteria the whole dataset is reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub dataset_id: Uuid,
    #[serde(default)]
    pub criteria: Option<FilterCriteria>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub dataset_id: Uuid,
    /// `"ready"`, or `"empty"` when no record matched.
    pub status: String,
    pub report: Report,
}

impl ReportResponse {
    pub fn new(dataset_id: Uuid, report: Report) -> Self {
        let status = if report.is_empty() { "empty" } else { "ready" };
        Self { dataset_id, status: status.to_string(), report }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = error_response("File is empty");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "File is empty");
    }

    #[test]
    fn test_report_request_without_criteria() {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, b"x");
        let body = format!(r#"{{ "datasetId": "{}" }}"#, id);
        let request: ReportRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(request.dataset_id, id);
        assert!(request.criteria.is_none());
    }

    #[test]
    fn test_report_request_with_criteria() {
        let body = r#"{
            "datasetId": "6ba7b812-9dad-11d1-80b4-00c04fd430c8",
            "criteria": {
                "storeSet": ["Store1"],
                "coupons": { "mode": "keywords", "keywords": ["tm"] },
                "dateStart": "2024-01-01",
                "dateEnd": "2024-01-31"
            }
        }"#;
        let request: ReportRequest = serde_json::from_str(body).unwrap();
        let criteria = request.criteria.unwrap();
        assert!(criteria.store_set.contains("Store1"));
        assert_eq!(criteria.date_end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }
}
