//! Local input errors raised before anything is sent

use thiserror::Error;

/// Rejected form or mapping input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Numeric field given text that does not parse
    #[error("'{input}' is not a number (field '{key}')")]
    InvalidNumber {
        /// Field key
        key: String,
        /// Raw input
        input: String,
    },

    /// Select field given a value outside its options
    #[error("'{value}' is not an option for '{key}'")]
    NotAnOption {
        /// Field key
        key: String,
        /// Rejected value
        value: String,
    },

    /// Key is not a property of the schema
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Header is not a column of the uploaded sheet
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Import target is not an event field
    #[error("Unknown event field: {0}")]
    UnknownEventField(String),

    /// Column mapping without an event date
    #[error("Event Date mapping is required")]
    MissingDateMapping,
}

/// Result type for form operations
pub type FormResult<T> = Result<T, FormError>;
