//! Error types for telemetry operations.

use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
    /// The requested log format is not one of the supported names.
    #[error("unknown log format '{value}'")]
    UnknownFormat {
        /// Rejected format name.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn unknown_format_names_the_value() {
        let err = TelemetryError::UnknownFormat {
            value: "xml".to_string(),
        };
        assert_eq!(err.to_string(), "unknown log format 'xml'");
        assert!(err.source().is_none());
    }
}
