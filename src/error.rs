use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MteError>;

/// Error type covering the different failure cases that can occur while the
/// service hydrates its store, answers lookups, or talks to Airtable.
#[derive(Debug, Error)]
pub enum MteError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors raised by the SQLite store.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Transport-level failures of the outbound HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Raised when a sheet does not follow the declared schema.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a spreadsheet cell cannot be converted to its column type.
    #[error("sheet '{sheet}' row {row}: column '{column}' expects a number, found '{value}'")]
    InvalidCell {
        sheet: String,
        row: u32,
        column: String,
        value: String,
    },

    /// Raised when a stored value cannot be read back as a number.
    #[error("invalid literal value '{value}' in column {column}")]
    InvalidLiteral { column: String, value: String },

    /// Raised when the spreadsheet needed to build the store does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
