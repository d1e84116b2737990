//! MIFARE Ultralight page commands
//!
//! Ultralight memory is organized in 4 byte pages. The reader returns at most
//! 16 bytes per read, so a single read spans up to four pages.

use bytes::Bytes;
use cardlink_apdu_core::Command;

use crate::{CLA_PCSC, Error, INS_READ_BINARY, INS_UPDATE_BINARY, Result};

/// Size of an Ultralight page in bytes
pub const PAGE_SIZE: usize = 4;

/// Maximum number of pages returned by one read
pub const MAX_READ_BLOCKS: u8 = 4;

/// Build a READ BINARY for `block_count` pages starting at `page`
///
/// The expected length byte is `block_count * 4`.
pub fn read(page: u8, block_count: u8) -> Result<Command> {
    if !(1..=MAX_READ_BLOCKS).contains(&block_count) {
        return Err(Error::InvalidBlockCount(block_count));
    }
    // At most 16, always fits
    let le = block_count * PAGE_SIZE as u8;
    Ok(Command::new_with_le(CLA_PCSC, INS_READ_BINARY, 0x00, page, le))
}

/// Build an UPDATE BINARY writing exactly one page
pub fn write(page: u8, data: &[u8]) -> Result<Command> {
    Error::check_length("page data", PAGE_SIZE, data)?;
    Ok(Command::new_with_data(
        CLA_PCSC,
        INS_UPDATE_BINARY,
        0x00,
        page,
        Bytes::copy_from_slice(data),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_four_blocks() {
        let cmd = read(0x04, 4).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), &[0xFF, 0xB0, 0x00, 0x04, 0x10]);
    }

    #[test]
    fn test_read_single_block() {
        let cmd = read(0x04, 1).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), &[0xFF, 0xB0, 0x00, 0x04, 0x04]);
    }

    #[test]
    fn test_read_rejects_block_count() {
        assert_eq!(read(0x04, 0), Err(Error::InvalidBlockCount(0)));
        assert_eq!(read(0x04, 5), Err(Error::InvalidBlockCount(5)));
    }

    #[test]
    fn test_write_page() {
        let cmd = write(0x04, &[0x00, 0x01, 0x02, 0x03]).unwrap();
        assert_eq!(
            cmd.to_bytes().as_ref(),
            &[0xFF, 0xD6, 0x00, 0x04, 0x04, 0x00, 0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn test_write_rejects_wrong_size() {
        assert_eq!(
            write(0x04, &[0x00, 0x01, 0x02]),
            Err(Error::InvalidDataLength {
                field: "page data",
                expected: 4,
                actual: 3
            })
        );
        assert!(write(0x04, &[0u8; 16]).is_err());
    }
}
