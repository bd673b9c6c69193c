use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed input row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl EtlError {
    /// 單列錯誤只會跳過該列，不會中止整批
    pub fn is_row_level(&self) -> bool {
        matches!(self, EtlError::MalformedRow { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::HttpError(_) => "Check TLS support and proxy settings of this machine",
            EtlError::CsvError(_) => "Make sure the input is a valid CSV file with a header row",
            EtlError::IoError(_) => "Check that the input file exists and the output directory is writable",
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            EtlError::MalformedRow { .. } => "Fill in the IP column of the reported row",
            EtlError::ValidationError { .. } => "Check the input header and the --ip-column option",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ValidationError { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
