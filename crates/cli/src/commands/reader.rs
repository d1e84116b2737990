//! Commands for reader and raw APDU operations

use std::error::Error;

use cardlink_apdu_core::Command;
use cardlink_mifare::{FirmwareVersion, firmware_version, get_uid};
use cardlink_pcsc::{ResourceManager, Session};
use tracing::debug;

use crate::utils::{HexBytes, display};

/// List all available readers
pub fn list_command<M: ResourceManager>(session: &Session<M>) -> Result<(), Box<dyn Error>> {
    let readers = session.readers()?;

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        println!("{}. {}", i + 1, reader);
    }

    Ok(())
}

/// Show reader name, card state, protocol and ATR
pub fn info_command<M: ResourceManager>(session: &Session<M>) -> Result<(), Box<dyn Error>> {
    let status = session.status()?;

    println!(
        "{}",
        display::key_value_box(
            "Card",
            vec![
                ("Reader", status.reader_name().to_string()),
                ("State", format!("{:?}", status.state())),
                ("Protocol", status.protocol().to_string()),
                ("ATR", display::hex_bytes(status.atr())),
            ],
        )
    );

    Ok(())
}

/// Query the reader firmware version
pub fn firmware_command<M: ResourceManager>(
    session: &mut Session<M>,
) -> Result<(), Box<dyn Error>> {
    let response = session.execute(&firmware_version())?;
    let firmware = FirmwareVersion::new(response.payload().to_vec());

    println!("Firmware: {firmware}");
    println!("{}", display::response(&response));
    Ok(())
}

/// Read the UID of the card in the field
pub fn uid_command<M: ResourceManager>(session: &mut Session<M>) -> Result<(), Box<dyn Error>> {
    let response = session.execute(&get_uid())?;

    println!("UID: {}", display::hex_bytes(response.payload()));
    Ok(())
}

/// Send a raw APDU and show the response whatever its status
pub fn send_command<M: ResourceManager>(
    session: &mut Session<M>,
    apdu: &HexBytes,
) -> Result<(), Box<dyn Error>> {
    let command = Command::from_bytes(apdu.as_slice())?;
    debug!(%command, "Sending APDU");

    let response = session.transmit(&command)?;
    println!("{}", display::response(&response));
    Ok(())
}
