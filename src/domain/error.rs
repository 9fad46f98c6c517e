//! Domain error types.

/// Top-level error type for idxflow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("data error in field {field} for {code}: {reason}")]
    Data {
        field: String,
        code: String,
        reason: String,
    },

    #[error("invalid date range {start} to {end}: {reason}")]
    InvalidRange {
        start: String,
        end: String,
        reason: String,
    },

    #[error("unsupported operation {operation}: {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    #[error("dataset error: {reason}")]
    Dataset { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FlowError {
    pub fn data(field: &str, code: &str, reason: impl Into<String>) -> Self {
        FlowError::Data {
            field: field.to_string(),
            code: code.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&FlowError> for std::process::ExitCode {
    fn from(err: &FlowError) -> Self {
        let code: u8 = match err {
            FlowError::Io(_) | FlowError::Dataset { .. } => 1,
            FlowError::ConfigParse { .. }
            | FlowError::ConfigMissing { .. }
            | FlowError::ConfigInvalid { .. } => 2,
            FlowError::Data { .. } => 3,
            FlowError::InvalidRange { .. } => 4,
            FlowError::UnsupportedOperation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
