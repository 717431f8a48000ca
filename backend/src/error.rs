//! Error types for the coupon statistics pipeline.
//!
//! - [`LoadError`] - reading and typing an uploaded extract
//! - [`ConfigError`] - loading the report configuration
//! - [`PipelineError`] - top-level report orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Everything past a successful load is total over well-typed input, so the
//! only fallible stages are loading, configuration and criteria checks.
//! Conversion is automatic via `From` so `?` works across boundaries.

use thiserror::Error;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading an extract into a record set.
///
/// Any of these aborts the upload; no partial table is produced.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read the source.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// No content at all. A header-only file loads as an empty table.
    #[error("File is empty")]
    EmptyFile,

    /// One or more required columns are absent from the header.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Sale date is not an 8-digit `YYYYMMDD` calendar date.
    #[error("Line {line}: invalid sale date '{value}' (expected YYYYMMDD)")]
    InvalidDate { line: usize, value: String },

    /// Quantity is not a non-negative integer.
    #[error("Line {line}: invalid quantity '{value}' (expected a non-negative integer)")]
    InvalidQuantity { line: usize, value: String },

    /// Malformed CSV structure.
    #[error("Line {line}: malformed row: {message}")]
    Csv { line: usize, message: String },

    /// Workbook container or sheet could not be read.
    #[error("Failed to read workbook: {0}")]
    Workbook(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a [`crate::config::ReportConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level report errors.
///
/// Returned by [`crate::transform::pipeline::load_dataset`] and
/// [`crate::transform::pipeline::build_report`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Criteria that cannot describe any selection, e.g. an inverted date range.
    #[error("Invalid filter criteria: {0}")]
    InvalidCriteria(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type LoadResult<T> = Result<T, LoadError>;

pub type ConfigResult<T> = Result<T, ConfigError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let load_err = LoadError::EmptyFile;
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let server_err: ServerError = PipelineError::InvalidCriteria("range".into()).into();
        assert!(server_err.to_string().contains("range"));
    }

    #[test]
    fn test_missing_columns_lists_all() {
        let err = LoadError::MissingColumns(vec!["SaleDy".into(), "Qty".into()]);
        let msg = err.to_string();
        assert!(msg.contains("SaleDy, Qty"));
    }

    #[test]
    fn test_row_error_format() {
        let err = LoadError::InvalidQuantity { line: 7, value: "abc".into() };
        let msg = err.to_string();
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("'abc'"));
    }
}
