//! Error types for PC/SC sessions

use cardlink_apdu_core::{ResponseError, StatusError};

use crate::discovery::ReaderName;
use crate::protocol::NegotiatedProtocol;

/// Result type for PC/SC session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session errors, each tied to the [`Stage`] that produced it
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource manager is unavailable
    #[error("Failed to establish PC/SC context: {0}")]
    Context(#[source] pcsc::Error),

    /// Releasing the context failed
    #[error("Failed to release PC/SC context: {0}")]
    ContextRelease(#[source] pcsc::Error),

    /// The context was already released
    #[error("PC/SC context already released")]
    ContextReleased,

    /// Listing returned no readers, or the listing itself failed
    #[error("No readers found")]
    NoReadersFound(#[source] Option<pcsc::Error>),

    /// No listed reader matches the requested selector
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present, or the reader is held exclusively elsewhere
    #[error("Failed to connect to card in reader {reader}: {source}")]
    Connection {
        /// Reader the connection was attempted on
        reader: ReaderName,
        /// Resource manager error
        #[source]
        source: pcsc::Error,
    },

    /// Releasing the card link failed
    #[error("Failed to disconnect from card: {0}")]
    Disconnect(#[source] pcsc::Error),

    /// Operation needs a connected card
    #[error("No card connected")]
    NotConnected,

    /// Status query failed, typically on a stale handle
    #[error("Failed to get card status: {0}")]
    Status(#[source] pcsc::Error),

    /// The card reported an ATR longer than the PC/SC maximum
    #[error("ATR too long: {0} bytes (max {max})", max = pcsc::MAX_ATR_SIZE)]
    InvalidAtr(usize),

    /// The negotiated protocol has no transport header
    #[error("Unsupported transmission protocol: {0}")]
    Protocol(NegotiatedProtocol),

    /// The response does not fit the channel's buffer
    #[error("Response exceeds channel capacity of {capacity} bytes")]
    ResponseOverflow {
        /// Channel capacity in bytes
        capacity: usize,
        /// Reported response length, when the resource manager returned one
        length: Option<usize>,
    },

    /// The exchange primitive failed
    #[error("Failed to transmit command: {0}")]
    Transmission(#[source] pcsc::Error),

    /// The card answered with a status word other than `90 00`
    #[error("Card rejected command: {0}")]
    UnexpectedStatus(#[from] StatusError),

    /// The response could not be decoded
    #[error("Malformed response: {0}")]
    Response(#[from] ResponseError),
}

/// Session stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Stage {
    /// Establishing the resource manager context
    Establish,
    /// Listing and selecting readers
    Discover,
    /// Connecting to the card
    Connect,
    /// Querying card status
    Status,
    /// Exchanging an APDU
    Transmit,
    /// Releasing the card link
    Disconnect,
    /// Releasing the context
    Release,
}

impl Error {
    /// The stage that failed
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Context(_) => Stage::Establish,
            Self::ContextRelease(_) | Self::ContextReleased => Stage::Release,
            Self::NoReadersFound(_) | Self::ReaderNotFound(_) => Stage::Discover,
            Self::Connection { .. } | Self::NotConnected => Stage::Connect,
            Self::Status(_) | Self::InvalidAtr(_) => Stage::Status,
            Self::Protocol(_)
            | Self::ResponseOverflow { .. }
            | Self::Transmission(_)
            | Self::UnexpectedStatus(_)
            | Self::Response(_) => Stage::Transmit,
            Self::Disconnect(_) => Stage::Disconnect,
        }
    }

    /// The underlying resource manager error, if any
    pub const fn pcsc_error(&self) -> Option<pcsc::Error> {
        match self {
            Self::Context(e)
            | Self::ContextRelease(e)
            | Self::Connection { source: e, .. }
            | Self::Disconnect(e)
            | Self::Status(e)
            | Self::Transmission(e)
            | Self::NoReadersFound(Some(e)) => Some(*e),
            _ => None,
        }
    }
}
