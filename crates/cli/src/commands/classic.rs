//! Commands for MIFARE Classic cards

use std::error::Error;

use cardlink_mifare::classic::{self, KeyType};
use cardlink_pcsc::{ResourceManager, Session};
use clap::{Args, Subcommand};
use tracing::{debug, warn};

use crate::utils::{HexBytes, display, parse_address};

/// Sector authentication arguments
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AuthArgs {
    /// Sector key in hex (6 bytes)
    #[arg(long, default_value = "FFFFFFFFFFFF")]
    pub key: HexBytes,

    /// Key to authenticate with (A or B)
    #[arg(long, default_value = "A")]
    pub key_type: KeyType,
}

/// Classic block operations, each preceded by load key and authenticate
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ClassicCommand {
    /// Read one 16 byte block
    Read {
        /// Block to read
        #[arg(long, value_parser = parse_address)]
        block: u8,

        /// Authentication arguments
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Write one 16 byte block
    Write {
        /// Block to write
        #[arg(long, value_parser = parse_address)]
        block: u8,

        /// Block data in hex
        #[arg(long)]
        data: HexBytes,

        /// Authentication arguments
        #[command(flatten)]
        auth: AuthArgs,
    },
}

/// Load the key and authenticate the sector holding `block`
fn authenticate<M: ResourceManager>(
    session: &mut Session<M>,
    block: u8,
    auth: &AuthArgs,
) -> Result<(), Box<dyn Error>> {
    session.execute(&classic::load_key(auth.key.as_slice())?)?;
    session.execute(&classic::authenticate(block, auth.key_type)?)?;
    debug!(block, sector = classic::sector_of(block), "Sector authenticated");
    Ok(())
}

/// Run a Classic subcommand
pub fn classic_command<M: ResourceManager>(
    session: &mut Session<M>,
    command: &ClassicCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        ClassicCommand::Read { block, auth } => {
            authenticate(session, *block, auth)?;
            let response = session.execute(&classic::read(*block))?;
            println!("Block {block}: {}", display::hex_bytes(response.payload()));
        }
        ClassicCommand::Write { block, data, auth } => {
            // Validate before touching the card
            let write = classic::write(*block, data.as_slice())?;
            if classic::is_sector_trailer(*block) {
                warn!(block, "Writing a sector trailer changes keys and access bits");
            }

            authenticate(session, *block, auth)?;
            session.execute(&write)?;
            let written = display::hex_bytes(data.as_slice());
            println!(
                "{}",
                display::success(&format!("Wrote {written} to block {block}"))
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use cardlink_pcsc::PcscConfig;
    use cardlink_pcsc::mock::MockReader;

    use super::*;

    fn auth(key: &str, key_type: KeyType) -> AuthArgs {
        AuthArgs {
            key: key.parse().unwrap(),
            key_type,
        }
    }

    #[test]
    fn test_read_authenticates_first() {
        let mock = MockReader::classic();
        let mut session = Session::open(&mock, PcscConfig::default()).unwrap();

        let command = ClassicCommand::Read {
            block: 4,
            auth: auth("FFFFFFFFFFFF", KeyType::A),
        };
        classic_command(&mut session, &command).unwrap();
        session.close().unwrap();

        assert_eq!(
            mock.commands(),
            vec![
                vec![0xFF, 0x82, 0x00, 0x00, 0x06, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
                vec![0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00, 0x04, 0x60, 0x00],
                vec![0xFF, 0xB0, 0x00, 0x04, 0x10],
            ]
        );
    }

    #[test]
    fn test_write_then_read_block() {
        let mock = MockReader::classic();
        let mut session = Session::open(&mock, PcscConfig::default()).unwrap();
        let data: Vec<u8> = (0x10..0x20).collect();

        let write = ClassicCommand::Write {
            block: 5,
            data: hex::encode(&data).parse().unwrap(),
            auth: auth("FFFFFFFFFFFF", KeyType::B),
        };
        classic_command(&mut session, &write).unwrap();

        let response = session.execute(&classic::read(5)).unwrap();
        assert_eq!(response.payload(), data.as_slice());
        session.close().unwrap();

        let commands = mock.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[1][8], 0x61);
        assert_eq!(&commands[2][..5], &[0xFF, 0xD6, 0x00, 0x05, 0x10]);
    }

    #[test]
    fn test_wrong_key_stops_before_block_access() {
        let mock = MockReader::classic();
        let mut session = Session::open(&mock, PcscConfig::default()).unwrap();

        let command = ClassicCommand::Read {
            block: 4,
            auth: auth("A0A1A2A3A4A5", KeyType::A),
        };
        let err = classic_command(&mut session, &command).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<cardlink_pcsc::Error>(),
            Some(cardlink_pcsc::Error::UnexpectedStatus(_))
        ));

        // Load key and authenticate only
        assert_eq!(mock.commands().len(), 2);
        session.close().unwrap();
    }

    #[test]
    fn test_write_rejects_bad_length_before_card() {
        let mock = MockReader::classic();
        let mut session = Session::open(&mock, PcscConfig::default()).unwrap();

        let command = ClassicCommand::Write {
            block: 4,
            data: "00010203".parse().unwrap(),
            auth: auth("FFFFFFFFFFFF", KeyType::A),
        };
        assert!(classic_command(&mut session, &command).is_err());
        assert!(mock.commands().is_empty());
        session.close().unwrap();
    }
}
