//! Error type for command construction

use cardlink_apdu_core::CommandError;

/// Result type for command builders
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid command arguments, reported before any byte is emitted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Ultralight reads span one to four pages
    #[error(
        "Invalid block count {0}: expected 1 to {max}",
        max = crate::ultralight::MAX_READ_BLOCKS
    )]
    InvalidBlockCount(u8),

    /// A fixed-size argument has the wrong length
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidDataLength {
        /// Argument name
        field: &'static str,
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Unknown key type name
    #[error("Invalid key type {0:?}: expected A or B")]
    InvalidKeyType(String),

    /// The assembled command was rejected
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl Error {
    pub(crate) fn check_length(field: &'static str, expected: usize, data: &[u8]) -> Result<()> {
        if data.len() == expected {
            Ok(())
        } else {
            Err(Self::InvalidDataLength {
                field,
                expected,
                actual: data.len(),
            })
        }
    }
}
