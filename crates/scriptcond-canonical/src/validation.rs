use thiserror::Error;

/// Rejections raised while building identifiers and digests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Text that does not match the identifier or digest pattern.
    #[error("{field} ('{value}') is not allowed")]
    PatternMismatch {
        /// Rejected field.
        field: &'static str,
        /// Rejected text.
        value: String,
    },
    /// Digest bytes of the wrong size for their algorithm.
    #[error("{field} must be {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Rejected field.
        field: &'static str,
        /// Size required by the algorithm.
        expected: usize,
        /// Size found.
        actual: usize,
    },
}
