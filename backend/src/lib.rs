//! # couponstats - Coupon redemption statistics
//!
//! Loads a coupon redemption extract, filters it by store, coupon and date,
//! and produces the cross-tabs and chart layout a report needs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌────────────┐
//! │CSV / XLSX│──▶│  Parser  │──▶│ Normalize │──▶│ Filter  │──▶│ Aggregate  │
//! │(ISO/UTF8)│   │(auto-enc)│   │ (name map)│   │         │   │            │
//! └──────────┘   └──────────┘   └───────────┘   └────┬────┘   └─────┬──────┘
//!                                                    │              │
//!                                          ┌─────────▼──┐   ┌───────▼──────┐
//!                                          │ Store x    │   │ Date x Coupon│
//!                                          │ Coupon     │   │ + Layout     │
//!                                          └────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use couponstats::{build_report, load_dataset_file, FilterCriteria, ReportConfig};
//!
//! let config = ReportConfig::default();
//! let table = load_dataset_file("extract.csv".as_ref(), &config)?;
//! let criteria = FilterCriteria::covering(&table.records).with_keywords(["tm", "dormant"]);
//! let report = build_report(&table.records, &criteria, &config)?;
//! println!("{}", report.layout.title);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Report configuration (name map, aliases, layout flags)
//! - [`models`] - Records, record sets and filter criteria
//! - [`parser`] - CSV and Excel loading with auto-detection
//! - [`transform`] - Normalize, filter, aggregate, pivot and pipeline
//! - [`layout`] - Chart layout planning
//! - [`export`] - Tables for download
//! - [`cache`] - Uploaded dataset cache
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Loading
pub mod parser;

// Transformation
pub mod transform;

// Presentation
pub mod export;
pub mod layout;

// Caching
pub mod cache;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, LoadError, LoadResult, PipelineError, PipelineResult, ServerError,
    ServerResult,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{port_from_env, ColumnNames, LayoutOptions, ReportConfig};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{parse_keywords, AggregatedPoint, CouponFilter, FilterCriteria, Record, RecordSet};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_bytes_auto, load_file_auto,
    load_workbook_bytes, LoadedTable, SourceFormat, MAX_QUANTITY,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{build_report, load_dataset, load_dataset_file, Report};
pub use transform::{DateCouponMatrix, StoreCouponMatrix, StoreRow, Summary};

// =============================================================================
// Re-exports - Layout
// =============================================================================

pub use layout::{plan_layout, ChartLayout, DensityBand, LabelPosition};

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::{CachedDataset, DatasetCache};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
