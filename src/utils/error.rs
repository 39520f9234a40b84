use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionedMapError {
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

    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Consistency check failed: {message}")]
    ConsistencyError { message: String },

    #[error("Worker task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Input,
    Consistency,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl VersionedMapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) => ErrorCategory::Io,
            Self::SerializationError(_) => ErrorCategory::Runtime,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::ParseError { .. } => ErrorCategory::Input,
            Self::ConsistencyError { .. } => ErrorCategory::Consistency,
            Self::TaskError { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ParseError { .. } => ErrorSeverity::Medium,
            Self::IoError(_)
            | Self::SerializationError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
            Self::ConsistencyError { .. } | Self::TaskError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("Could not read or write a file: {}", e),
            Self::SerializationError(e) => format!("Could not render output as JSON: {}", e),
            Self::ConfigError { message } => format!("The configuration is invalid: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::ParseError { line, message } => {
                format!("Script line {} could not be understood: {}", line, message)
            }
            Self::ConsistencyError { message } => {
                format!("The map returned inconsistent results: {}", message)
            }
            Self::TaskError { message } => format!("A worker stopped unexpectedly: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the path exists and is readable",
            ErrorCategory::Configuration => "Fix the value in the TOML file or on the command line",
            ErrorCategory::Input => {
                "Use one of: put, get, delete, version, clear, history, snapshot, keys"
            }
            ErrorCategory::Consistency => "Re-run with --verbose and report the log output",
            ErrorCategory::Runtime => "Re-run with --verbose to see more detail",
        }
    }
}

pub type Result<T> = std::result::Result<T, VersionedMapError>;
