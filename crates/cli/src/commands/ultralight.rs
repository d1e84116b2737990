//! Commands for MIFARE Ultralight cards

use std::error::Error;

use cardlink_mifare::ultralight;
use cardlink_pcsc::{ResourceManager, Session};
use clap::Subcommand;

use crate::utils::{HexBytes, display, parse_address};

/// Ultralight page operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UltralightCommand {
    /// Read up to four pages
    Read {
        /// First page to read
        #[arg(long, value_parser = parse_address)]
        page: u8,

        /// Number of pages (1 to 4)
        #[arg(long, default_value_t = ultralight::MAX_READ_BLOCKS)]
        blocks: u8,
    },

    /// Write one 4 byte page
    Write {
        /// Page to write
        #[arg(long, value_parser = parse_address)]
        page: u8,

        /// Page data in hex
        #[arg(long)]
        data: HexBytes,
    },
}

/// Run an Ultralight subcommand
pub fn ultralight_command<M: ResourceManager>(
    session: &mut Session<M>,
    command: &UltralightCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        UltralightCommand::Read { page, blocks } => {
            let response = session.execute(&ultralight::read(*page, *blocks)?)?;
            println!("Page {page}: {}", display::hex_bytes(response.payload()));
        }
        UltralightCommand::Write { page, data } => {
            session.execute(&ultralight::write(*page, data.as_slice())?)?;
            let written = display::hex_bytes(data.as_slice());
            println!("{}", display::success(&format!("Wrote {written} to page {page}")));
        }
    }

    Ok(())
}
