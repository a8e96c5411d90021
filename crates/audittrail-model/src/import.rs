//! Spreadsheet import DTOs
//!
//! Import runs in three phases keyed by a server session id:
//! upload → validate (column mapping) → confirm.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of uploading a spreadsheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportUploadResponse {
    /// Import session
    pub session_id: String,
    /// Uploaded file name
    pub filename: String,
    /// Detected column headers
    pub headers: Vec<String>,
    /// Number of data rows
    pub row_count: usize,
    /// First rows, cell values as sent
    #[serde(default)]
    pub preview_rows: Vec<Vec<Value>>,
}

/// Column → event field mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMappingRequest {
    /// Import session
    pub session_id: String,
    /// Header → event field
    pub mappings: IndexMap<String, String>,
}

/// Validation outcome for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportValidationRow {
    /// 1-based row number
    pub row_number: usize,
    /// Row passed validation
    pub valid: bool,
    /// Problems found
    #[serde(default)]
    pub errors: Vec<String>,
    /// Parsed row
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Validation outcome for the whole file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportValidationResponse {
    /// Import session
    pub session_id: String,
    /// Rows examined
    pub total_rows: usize,
    /// Rows that will import
    pub valid_count: usize,
    /// Rows that will not
    pub error_count: usize,
    /// Per-row results
    #[serde(default)]
    pub rows: Vec<ImportValidationRow>,
}

/// Body of the confirm call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfirmRequest {
    /// Import session
    pub session_id: String,
}

/// Result of the confirm call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfirmResponse {
    /// Events created
    pub created_count: usize,
    /// Rows that failed
    pub error_count: usize,
    /// Failure descriptions
    #[serde(default)]
    pub errors: Vec<String>,
}
