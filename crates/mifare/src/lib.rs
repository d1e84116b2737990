//! APDU builders for MIFARE cards behind a PC/SC contactless reader
//!
//! Contactless readers such as the ACR122U expose MIFARE memory operations as
//! pseudo-APDUs with class byte `FF` (PC/SC part 3 storage card commands).
//! Every builder in this crate is pure: it validates its arguments and returns
//! a finished [`Command`](cardlink_apdu_core::Command) without touching a reader.
//!
//! ```
//! use cardlink_mifare::{classic, ultralight};
//!
//! let read = ultralight::read(0x04, 4).unwrap();
//! assert_eq!(read.to_bytes().as_ref(), &[0xFF, 0xB0, 0x00, 0x04, 0x10]);
//!
//! let auth = classic::authenticate(0x04, classic::KeyType::A).unwrap();
//! assert_eq!(auth.to_bytes().len(), 10);
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]

pub mod classic;
mod error;
pub mod reader;
pub mod ultralight;

pub use error::{Error, Result};
pub use reader::{FirmwareVersion, firmware_version, get_uid};

/// Class byte of PC/SC reader pseudo-APDUs
pub const CLA_PCSC: u8 = 0xFF;

/// READ BINARY
pub(crate) const INS_READ_BINARY: u8 = 0xB0;
/// UPDATE BINARY
pub(crate) const INS_UPDATE_BINARY: u8 = 0xD6;
