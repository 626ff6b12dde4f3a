//! # Error Types
//!
//! Custom error types for the GPS logger decoder using `thiserror`.

use thiserror::Error;

use crate::codec::protocol::Variant;

/// Errors produced while turning a raw buffer into a telemetry record
///
/// A checksum mismatch is not an error; it is reported through
/// [`crate::codec::protocol::Checksum::valid`] on an otherwise complete record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Buffer length does not match the variant's fixed record length
    #[error("{variant} packet size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        variant: Variant,
        expected: usize,
        actual: usize,
    },

    /// Buffer was correctly sized but a field could not be read from it
    #[error("failed to unpack field `{field}` at offset {offset}")]
    FieldUnpack { field: &'static str, offset: usize },
}

/// Main error type for the GPS logger decoder
#[derive(Debug, Error)]
pub enum GpsLogError {
    /// Packet decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export errors
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON Lines export errors
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the GPS logger decoder
pub type Result<T> = std::result::Result<T, GpsLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_message() {
        let err = DecodeError::SizeMismatch {
            variant: Variant::Live,
            expected: 40,
            actual: 39,
        };
        assert_eq!(
            err.to_string(),
            "live packet size mismatch: expected 40 bytes, got 39"
        );
    }

    #[test]
    fn test_decode_error_converts() {
        let err: GpsLogError = DecodeError::FieldUnpack {
            field: "heading",
            offset: 18,
        }
        .into();
        assert!(matches!(err, GpsLogError::Decode(_)));
        assert!(err.to_string().contains("heading"));
    }
}
