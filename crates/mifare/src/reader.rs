//! Commands addressed to the reader rather than the card

use std::fmt;

use bytes::Bytes;
use cardlink_apdu_core::Command;

use crate::CLA_PCSC;

/// Build the firmware version query (`FF 00 48 00 00`)
pub const fn firmware_version() -> Command {
    Command::new_with_le(CLA_PCSC, 0x00, 0x48, 0x00, 0x00)
}

/// Build the GET DATA command returning the card UID (`FF CA 00 00 00`)
pub const fn get_uid() -> Command {
    Command::new_with_le(CLA_PCSC, 0xCA, 0x00, 0x00, 0x00)
}

/// Payload of a firmware version response
///
/// ACR122 readers answer with an ASCII string such as `ACR122U207`, other
/// readers with raw version bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion(Bytes);

impl FirmwareVersion {
    /// Wrap a response payload
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self(payload.into())
    }

    /// Raw version bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The version as text, if it is printable ASCII
    pub fn as_text(&self) -> Option<&str> {
        if self.0.is_empty() || !self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return None;
        }
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(text),
            None => f.write_str(&hex::encode_upper(&self.0)),
        }
    }
}
