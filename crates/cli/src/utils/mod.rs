//! Utility functions and types for the cardlink CLI

pub mod display;

use std::str::FromStr;

/// Byte string given on the command line as hex
///
/// Spaces and colons between digits are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    /// The decoded bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();
        hex::decode(digits).map(Self)
    }
}

/// Parse a page or block number, decimal or `0x` prefixed hex
pub fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}
