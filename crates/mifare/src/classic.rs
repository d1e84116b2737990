//! MIFARE Classic block commands
//!
//! Classic cards hold 16 byte blocks grouped in sectors, each protected by two
//! keys. A read or write only succeeds after the sector has been authenticated
//! with a key previously loaded into the reader's volatile key slot:
//!
//! 1. [`load_key`] stores the key in the reader
//! 2. [`authenticate`] proves the key against the sector containing the block
//! 3. [`read`] / [`write`] access the block
//!
//! The builders do not track authentication state; sequencing is up to the caller.

use std::str::FromStr;

use bytes::Bytes;
use cardlink_apdu_core::Command;

use crate::{CLA_PCSC, Error, INS_READ_BINARY, INS_UPDATE_BINARY, Result};

/// Size of a Classic block in bytes
pub const BLOCK_SIZE: usize = 16;

/// Size of a Classic sector key in bytes
pub const KEY_SIZE: usize = 6;

/// Factory transport key
pub const DEFAULT_KEY: [u8; KEY_SIZE] = [0xFF; KEY_SIZE];

/// Volatile key slot used for load and authenticate
pub const KEY_SLOT: u8 = 0x00;

const INS_LOAD_KEY: u8 = 0x82;
const INS_AUTHENTICATE: u8 = 0x86;
const AUTHENTICATE_VERSION: u8 = 0x01;

/// Which of the two sector keys to authenticate with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Key A
    A,
    /// Key B
    B,
}

impl KeyType {
    /// Key type byte of the authenticate data block
    pub const fn code(self) -> u8 {
        match self {
            Self::A => 0x60,
            Self::B => 0x61,
        }
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(Error::InvalidKeyType(other.to_string())),
        }
    }
}

/// Build LOAD AUTHENTICATION KEYS for the volatile key slot
pub fn load_key(key: &[u8]) -> Result<Command> {
    Error::check_length("key", KEY_SIZE, key)?;
    Ok(Command::new_with_data(
        CLA_PCSC,
        INS_LOAD_KEY,
        0x00,
        KEY_SLOT,
        Bytes::copy_from_slice(key),
    )?)
}

/// Build GENERAL AUTHENTICATE for the sector containing `block`
///
/// Uses the key loaded by [`load_key`].
pub fn authenticate(block: u8, key_type: KeyType) -> Result<Command> {
    let data = [
        AUTHENTICATE_VERSION,
        0x00, // block MSB
        block,
        key_type.code(),
        KEY_SLOT,
    ];
    Ok(Command::new_with_data(
        CLA_PCSC,
        INS_AUTHENTICATE,
        0x00,
        0x00,
        Bytes::copy_from_slice(&data),
    )?)
}

/// Build READ BINARY for one block
pub const fn read(block: u8) -> Command {
    Command::new_with_le(CLA_PCSC, INS_READ_BINARY, 0x00, block, BLOCK_SIZE as u8)
}

/// Build UPDATE BINARY for one block
///
/// The sector must have been authenticated first.
pub fn write(block: u8, data: &[u8]) -> Result<Command> {
    Error::check_length("block data", BLOCK_SIZE, data)?;
    Ok(Command::new_with_data(
        CLA_PCSC,
        INS_UPDATE_BINARY,
        0x00,
        block,
        Bytes::copy_from_slice(data),
    )?)
}

/// Sector holding `block` on 1K and 4K cards
///
/// Sectors 0 to 31 have 4 blocks each, sectors 32 to 39 have 16.
pub const fn sector_of(block: u8) -> u8 {
    if block < 128 {
        block / 4
    } else {
        32 + (block - 128) / 16
    }
}

/// Whether `block` is the trailer (keys and access bits) of its sector
pub const fn is_sector_trailer(block: u8) -> bool {
    if block < 128 {
        block % 4 == 3
    } else {
        (block - 128) % 16 == 15
    }
}
