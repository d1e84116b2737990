//! Property-based tests for the MIFARE command builders.
//!
//! Every builder must emit byte-exact APDUs for all valid inputs and refuse
//! every input of the wrong size.

use cardlink_mifare::{Error, classic, ultralight};
use proptest::prelude::*;

/// Strategy for block counts the reader accepts
fn valid_block_count() -> impl Strategy<Value = u8> {
    1u8..=ultralight::MAX_READ_BLOCKS
}

/// Strategy for byte vectors of any length except `len`
fn wrong_length(len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
        .prop_filter("must differ from the valid length", move |v| v.len() != len)
}

proptest! {
    #[test]
    fn ultralight_read_has_fixed_header(page in any::<u8>(), blocks in valid_block_count()) {
        let bytes = ultralight::read(page, blocks).unwrap().to_bytes();
        prop_assert_eq!(bytes.len(), 5);
        prop_assert_eq!(&bytes[..3], &[0xFF, 0xB0, 0x00]);
        prop_assert_eq!(bytes[3], page);
        prop_assert_eq!(bytes[4], blocks * 4);
    }

    #[test]
    fn ultralight_read_rejects_out_of_range(page in any::<u8>(), blocks in 5u8..) {
        prop_assert_eq!(ultralight::read(page, blocks), Err(Error::InvalidBlockCount(blocks)));
    }

    #[test]
    fn ultralight_write_appends_page(page in any::<u8>(), data in any::<[u8; 4]>()) {
        let bytes = ultralight::write(page, &data).unwrap().to_bytes();
        prop_assert_eq!(bytes.len(), 9);
        prop_assert_eq!(&bytes[..5], &[0xFF, 0xD6, 0x00, page, 0x04]);
        prop_assert_eq!(&bytes[5..], &data[..]);
    }

    #[test]
    fn ultralight_write_rejects_wrong_size(page in any::<u8>(), data in wrong_length(4)) {
        let is_length_error = matches!(
            ultralight::write(page, &data),
            Err(Error::InvalidDataLength { expected: 4, .. })
        );
        prop_assert!(is_length_error);
    }

    #[test]
    fn classic_write_appends_block(block in any::<u8>(), data in any::<[u8; 16]>()) {
        let bytes = classic::write(block, &data).unwrap().to_bytes();
        prop_assert_eq!(bytes.len(), 21);
        prop_assert_eq!(&bytes[..5], &[0xFF, 0xD6, 0x00, block, 0x10]);
        prop_assert_eq!(&bytes[5..], &data[..]);
    }

    #[test]
    fn classic_write_rejects_wrong_size(block in any::<u8>(), data in wrong_length(16)) {
        let is_length_error = matches!(
            classic::write(block, &data),
            Err(Error::InvalidDataLength { expected: 16, .. })
        );
        prop_assert!(is_length_error);
    }

    #[test]
    fn classic_load_key_carries_key(key in any::<[u8; 6]>()) {
        let bytes = classic::load_key(&key).unwrap().to_bytes();
        prop_assert_eq!(bytes.len(), 11);
        prop_assert_eq!(&bytes[..5], &[0xFF, 0x82, 0x00, 0x00, 0x06]);
        prop_assert_eq!(&bytes[5..], &key[..]);
    }

    #[test]
    fn classic_authenticate_addresses_block(block in any::<u8>(), key_b in any::<bool>()) {
        let key_type = if key_b { classic::KeyType::B } else { classic::KeyType::A };
        let bytes = classic::authenticate(block, key_type).unwrap().to_bytes();
        prop_assert_eq!(
            bytes.as_ref(),
            &[0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00, block, key_type.code(), 0x00]
        );
    }

    #[test]
    fn classic_sector_contains_block(block in any::<u8>()) {
        let sector = classic::sector_of(block);
        prop_assert!(sector < 40);
        let trailers_in_sector = (0..=255u8)
            .filter(|b| classic::sector_of(*b) == sector && classic::is_sector_trailer(*b))
            .count();
        prop_assert_eq!(trailers_in_sector, 1);
    }
}
