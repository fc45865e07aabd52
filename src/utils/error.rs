use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Parse,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::CsvError(e) if e.is_io_error() => ErrorCategory::Io,
            EtlError::CsvError(_) | EtlError::MalformedRow { .. } => ErrorCategory::Parse,
            EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Parse | ErrorCategory::Configuration | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) => format!("Could not access file: {}", e),
            EtlError::CsvError(e) => format!("Source file is not valid CSV: {}", e),
            EtlError::MalformedRow {
                line,
                expected,
                found,
            } => format!(
                "Row on line {} has {} columns but the header has {}",
                line, found, expected
            ),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            EtlError::ProcessingError { message } => format!("Conversion failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the source file exists and the directory is writable",
            ErrorCategory::Parse => {
                "Make sure every row has the same number of columns as the header"
            }
            ErrorCategory::Configuration => "Pass the path of a .csv indicator feed",
            ErrorCategory::Processing => "Re-run with --verbose for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
