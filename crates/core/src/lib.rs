//! Command and response types for APDU (Application Protocol Data Unit) exchanges
//!
//! This crate provides the byte-level vocabulary shared by the cardlink crates,
//! following the short APDU conventions of ISO/IEC 7816-4:
//!
//! - [`Command`]: an immutable command APDU (CLA, INS, P1, P2, optional data, optional Le)
//! - [`Response`]: a response APDU split into payload and [`StatusWord`]
//! - error types for malformed commands and responses
//!
//! Nothing here performs I/O. Transports live in `cardlink-pcsc`, command builders
//! for specific card families in `cardlink-mifare`.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod response;

pub use command::{Command, CommandError};
pub use response::error::{ResponseError, StatusError};
pub use response::status::StatusWord;
pub use response::Response;

/// Prelude module containing commonly used types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, Command, CommandError, Response, ResponseError, StatusError,
        StatusWord, response::status::common,
    };
}
