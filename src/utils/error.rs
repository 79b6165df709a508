use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Download of {url} failed: {source}")]
    FetchError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} returned HTTP {status}")]
    FetchStatusError { url: String, status: u16 },

    #[error("Archive error: {message}")]
    ArchiveError { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Cannot {operation} {path}: {source}")]
    FileAccessError {
        operation: FileOperation,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing column '{column}' in {file}")]
    SchemaError { file: String, column: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "read"),
            FileOperation::Write => write!(f, "write"),
        }
    }
}

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Fetch,
    Extract,
    Parse,
    Write,
    Config,
    System,
}

impl ErrorCategory {
    pub fn stage(&self) -> &'static str {
        match self {
            ErrorCategory::Fetch => "fetch",
            ErrorCategory::Extract => "extract",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Write => "write",
            ErrorCategory::Config => "config",
            ErrorCategory::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Worth retrying later, e.g. the registry was unreachable.
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::FetchError { .. } | EtlError::FetchStatusError { .. } => ErrorCategory::Fetch,
            EtlError::ArchiveError { .. }
            | EtlError::ZipError(_)
            | EtlError::FileAccessError {
                operation: FileOperation::Read,
                ..
            } => ErrorCategory::Extract,
            EtlError::SchemaError { .. } | EtlError::CsvError(_) => ErrorCategory::Parse,
            EtlError::FileAccessError {
                operation: FileOperation::Write,
                ..
            }
            | EtlError::SerializationError(_) => ErrorCategory::Write,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Config,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Fetch => ErrorSeverity::Medium,
            ErrorCategory::Extract
            | ErrorCategory::Parse
            | ErrorCategory::Write
            | ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        format!("{} stage failed: {}", self.category().stage(), self)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FetchError { .. } => {
                "Check your network connection, or download the archive manually and pass --registration-file/--reference-file"
            }
            EtlError::FetchStatusError { .. } => {
                "Verify --database-url points at the FAA ReleasableAircraft.zip archive"
            }
            EtlError::ArchiveError { .. } | EtlError::ZipError(_) => {
                "The archive must be a zip file containing MASTER.txt and ACFTREF.txt"
            }
            EtlError::FileAccessError { .. } => {
                "Make sure the path exists and that you have permission to read or write it"
            }
            EtlError::SchemaError { .. } | EtlError::CsvError(_) => {
                "The source files do not look like the FAA registry format; re-download them"
            }
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => {
                "Review the command line options and the configuration file"
            }
            EtlError::IoError(_) | EtlError::SerializationError(_) => {
                "Check available disk space and permissions"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
