use std::fmt;

use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unsupported file type: '{0}' (expected .xls or .xlsx)")]
    UnsupportedFileType(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("{0}")]
    Coercion(ImportRowError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Invalid import options: {0}")]
    InvalidOptions(String),

    #[error("Header row {row} is outside the sheet ({available} rows after the header band)")]
    MissingHeaderRow { row: usize, available: usize },
}

/// A single row/field coercion failure.
///
/// `row` is 1-based in source-sheet coordinates, `field` is the column's
/// display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRowError {
    pub row: usize,
    pub field: String,
    pub cause: String,
}

impl ImportRowError {
    pub fn new(row: usize, field: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for ImportRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Import data parse error at row {} ({}: {})",
            self.row, self.field, self.cause
        )
    }
}

impl From<ImportRowError> for SheetError {
    fn from(err: ImportRowError) -> Self {
        SheetError::Coercion(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_row_error_display() {
        let err = ImportRowError::new(4, "Age", "invalid decimal 'abc'");
        assert_eq!(
            err.to_string(),
            "Import data parse error at row 4 (Age: invalid decimal 'abc')"
        );
    }

    #[test]
    fn test_coercion_error_wraps_row_error() {
        let err: SheetError = ImportRowError::new(3, "Salary", "bad").into();
        match &err {
            SheetError::Coercion(row_err) => {
                assert_eq!(row_err.row, 3);
                assert_eq!(row_err.field, "Salary");
            }
            other => panic!("Expected Coercion, got {:?}", other),
        }
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_unsupported_file_type_message() {
        let err = SheetError::UnsupportedFileType("report.csv".to_string());
        assert!(err.to_string().contains("report.csv"));
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SheetError = io.into();
        assert!(matches!(err, SheetError::Io(_)));
    }
}
