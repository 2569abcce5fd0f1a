//! Error types for the dialect translation layer.

use thiserror::Error;

/// Error reported by a native database driver.
///
/// Drivers surface failures through their own exception types; this is the
/// normalized form the translation layer catches and re-wraps. The optional
/// vendor code carries the driver's numeric error code when one exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub vendor_code: Option<i32>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        DriverError {
            message: message.into(),
            vendor_code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        DriverError {
            message: message.into(),
            vendor_code: Some(code),
        }
    }
}

/// Main error type for statement translation and pagination.
#[derive(Error, Debug)]
pub enum ShimError {
    /// Configuration error (unknown dialect, missing database name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Placeholder/parameter count mismatch or unparseable statement shape.
    #[error("Malformed statement: {0}")]
    MalformedStatement(String),

    /// Value not representable on the target dialect's wire format.
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// Pagination requested without a deterministic ordering on a dialect
    /// that requires one.
    #[error("Pagination requires an explicit ordering on this dialect")]
    AmbiguousPagination,

    /// Driver failure while building or tearing down a pagination shim.
    #[error("Pagination failed during {phase}: {source}")]
    PaginationFailed {
        phase: &'static str,
        source: DriverError,
    },

    /// Driver error surfaced from execute/fetch.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl ShimError {
    /// Create a MalformedStatement error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ShimError::MalformedStatement(message.into())
    }

    /// Create an UnsupportedValue error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        ShimError::UnsupportedValue(message.into())
    }

    /// Create a PaginationFailed error for the given shim phase.
    pub fn pagination(phase: &'static str, source: DriverError) -> Self {
        ShimError::PaginationFailed { phase, source }
    }
}

/// Result type alias for translation operations.
pub type Result<T> = std::result::Result<T, ShimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::with_code("deadlock victim", 1205);
        assert_eq!(err.to_string(), "deadlock victim");
        assert_eq!(err.vendor_code, Some(1205));
    }

    #[test]
    fn test_pagination_error_wraps_driver_error() {
        let err = ShimError::pagination("insert", DriverError::new("constraint violation"));
        let text = err.to_string();
        assert!(text.contains("insert"));
        assert!(text.contains("constraint violation"));
    }
}
