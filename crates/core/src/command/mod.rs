//! APDU command definitions
//!
//! This module provides the [`Command`] type for short command APDUs
//! according to ISO/IEC 7816-4.

mod error;

pub use error::CommandError;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// Maximum data field length of a short APDU
pub const MAX_DATA_LENGTH: usize = 255;

/// Length of the CLA, INS, P1, P2 header
pub const HEADER_LENGTH: usize = 4;

/// Short APDU command
///
/// The Lc byte is never stored: it is derived from the data field when the
/// command is serialized, so the declared length always matches the data.
/// A command is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Option<Bytes>,
    le: Option<u8>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self::new(cla, ins, p1, p2).with_le(le)
    }

    /// Create a new command with a data payload
    ///
    /// An empty payload produces a command without Lc.
    pub fn new_with_data<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
    ) -> Result<Self, CommandError> {
        Self::new(cla, ins, p1, p2).with_data(data)
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Result<Self, CommandError> {
        let data = data.into();
        if data.len() > MAX_DATA_LENGTH {
            return Err(CommandError::DataTooLong(data.len()));
        }
        self.data = (!data.is_empty()).then_some(data);
        Ok(self)
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Command class (CLA)
    pub const fn class(&self) -> u8 {
        self.cla
    }

    /// Instruction code (INS)
    pub const fn instruction(&self) -> u8 {
        self.ins
    }

    /// First parameter (P1)
    pub const fn p1(&self) -> u8 {
        self.p1
    }

    /// Second parameter (P2)
    pub const fn p2(&self) -> u8 {
        self.p2
    }

    /// Command payload data, if any
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Expected response length (Le), if any
    pub const fn expected_length(&self) -> Option<u8> {
        self.le
    }

    /// Length of the serialized command
    pub fn len(&self) -> usize {
        let data = self.data.as_ref().map_or(0, |d| 1 + d.len());
        HEADER_LENGTH + data + usize::from(self.le.is_some())
    }

    /// A command always carries at least its header
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Serialize to raw APDU bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.len());

        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if let Some(data) = &self.data {
            // Bounded by MAX_DATA_LENGTH at construction
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }

        if let Some(le) = self.le {
            buffer.put_u8(le);
        }

        buffer.freeze()
    }

    /// Parse a command from raw short APDU bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, CommandError> {
        let (header, body) = match data.split_first_chunk::<HEADER_LENGTH>() {
            Some(parts) => parts,
            None => return Err(CommandError::InvalidLength(data.len())),
        };
        let [cla, ins, p1, p2] = *header;
        let command = Self::new(cla, ins, p1, p2);

        match body {
            // Case 1: header only
            [] => Ok(command),
            // Case 2: Le only
            [le] => Ok(command.with_le(*le)),
            // Cases 3 and 4: Lc, data and optional Le
            [lc, rest @ ..] => {
                let lc = usize::from(*lc);
                if lc == 0 {
                    return Err(CommandError::InvalidLength(data.len()));
                }
                match rest.len().checked_sub(lc) {
                    Some(0) => command.with_data(Bytes::copy_from_slice(rest)),
                    Some(1) => Ok(command
                        .with_data(Bytes::copy_from_slice(&rest[..lc]))?
                        .with_le(rest[lc])),
                    _ => Err(CommandError::InvalidLength(data.len())),
                }
            }
        }
    }
}

impl From<&Command> for Bytes {
    fn from(command: &Command) -> Self {
        command.to_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.to_bytes()))
    }
}
