use thiserror::Error;

/// Failures raised while cleaning. Lenient defaults never produce the
/// header or category variants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanError {
    #[error("Row {row}: expected {expected} column(s) but found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Header mismatch at position {position}: expected '{expected}' but found '{found}'")]
    HeaderMismatch {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("Row {row}: unmapped {field} text '{value}'")]
    UnmappedCategory {
        row: usize,
        field: &'static str,
        value: String,
    },
}
