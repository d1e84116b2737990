//! Error types specific to APDU commands

/// Error for APDU command construction and parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Raw command bytes do not form a valid short APDU
    #[error("Invalid command length: {0}")]
    InvalidLength(usize),

    /// Data field does not fit in a short APDU
    #[error("Data too long: {0} bytes (max {max})", max = super::MAX_DATA_LENGTH)]
    DataTooLong(usize),
}
