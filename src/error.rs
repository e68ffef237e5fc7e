//! Error types.
//!
//! - `AppError` is the application boundary error: a message plus the process
//!   exit code the `farm` binary should return.
//! - `EstimateError` and `StoreError` are library errors raised by the
//!   estimator and the record store. Both convert into `AppError`.
//!
//! Exit codes:
//! - `2` invalid input or configuration
//! - `3` missing data / record not found
//! - `4` I/O, storage, or terminal failure

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Target inputs the estimator refuses to compute on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("Target area must be a finite number > 0 (got {0}).")]
    InvalidArea(f64),

    #[error("Target month must be between 1 and 12 (got {0}).")]
    InvalidMonth(u32),
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown id, or a crop owned by somebody else (the two are not distinguished).
    #[error("Crop {id} not found for this user.")]
    CropNotFound { id: u64 },

    #[error("Harvest {id} not found for this user.")]
    HarvestNotFound { id: u64 },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Store I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file '{path}' is not valid JSON: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::Invalid { .. } => 2,
            StoreError::CropNotFound { .. } | StoreError::HarvestNotFound { .. } => 3,
            StoreError::Io { .. } | StoreError::Format { .. } => 4,
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_exit_codes() {
        let not_found: AppError = StoreError::CropNotFound { id: 7 }.into();
        assert_eq!(not_found.exit_code(), 3);
        assert!(not_found.message().contains('7'));

        let invalid: AppError = StoreError::invalid("area", "must be > 0").into();
        assert_eq!(invalid.exit_code(), 2);
        assert_eq!(invalid.message(), "Invalid area: must be > 0");
    }

    #[test]
    fn estimate_errors_are_input_errors() {
        let err: AppError = EstimateError::InvalidMonth(13).into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("13"));
    }
}
