//! Errors
//!
//! Custom error types used throughout the `house_price_intervals` crate.
use thiserror::Error;

/// Errors that can occur while running the interval pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unable to read an input file.
    #[error("Unable to read {0}: {1}")]
    UnableToRead(String, String),
    /// Unable to write an artifact.
    #[error("Unable to write {0}: {1}")]
    UnableToWrite(String, String),
    /// A column required by the pipeline is absent from the input header.
    #[error("Column {0} not found in the input table.")]
    MissingColumn(String),
    /// Sale date that could not be parsed.
    #[error("Row {row}: unable to parse {value:?} in column {column} as a date.")]
    InvalidDate { row: usize, column: String, value: String },
    /// Non-numeric value in a numeric column.
    #[error("Row {row}: unable to parse {value:?} in column {column} as a number.")]
    InvalidNumber { row: usize, column: String, value: String },
    /// Training row without a target value.
    #[error("Row {0} has no target value.")]
    MissingTarget(usize),
    /// Frame columns differ from the columns seen at fit time.
    #[error("Columns {0} do not match the fitted columns {1}.")]
    SchemaMismatch(String, String),
    /// Nothing to fit or split.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
