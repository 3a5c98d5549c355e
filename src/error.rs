//! Error types for the payroll calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading legal tables or
//! running a calculation.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the calculation engine.
///
/// All operations in the engine return this error type. Inputs are
/// validated before any computation starts, so an error never comes
/// with a partial result.
///
/// # Example
///
/// ```
/// use folha_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A bracket or rate table is empty or malformed.
    #[error("Invalid configuration for '{table}': {message}")]
    Configuration {
        /// The table that failed validation (e.g. "inss", "simples.annex_iii").
        table: String,
        /// A description of what made the table invalid.
        message: String,
    },

    /// No legal table set is effective on the requested date.
    #[error("No '{table}' table effective on {date}")]
    TableNotFound {
        /// The table that was requested.
        table: String,
        /// The date for which the table was requested.
        date: NaiveDate,
    },

    /// A calculation input was rejected before computation started.
    #[error("Invalid input field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn configuration(table: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Configuration {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
