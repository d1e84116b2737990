//! End-to-end walk through a connected Ultralight card

use std::error::Error;

use cardlink_mifare::ultralight;
use cardlink_pcsc::{ResourceManager, Session};

use super::{firmware_command, info_command};
use crate::utils::display;

const DEMO_PAGE: u8 = 0x04;
const DEMO_DATA: [u8; ultralight::PAGE_SIZE] = [0x00, 0x01, 0x02, 0x03];

/// Show card info and firmware, read page 4, then write `00 01 02 03` to it
pub fn demo_command<M: ResourceManager>(session: &mut Session<M>) -> Result<(), Box<dyn Error>> {
    println!("{}", display::step("Card status"));
    info_command(session)?;

    println!("{}", display::step("Reader firmware"));
    firmware_command(session)?;

    let pages = ultralight::MAX_READ_BLOCKS;
    println!(
        "{}",
        display::step(&format!("Reading {pages} pages from page {DEMO_PAGE}"))
    );
    let response = session.execute(&ultralight::read(DEMO_PAGE, pages)?)?;
    println!("{}", display::response(&response));

    println!(
        "{}",
        display::step(&format!(
            "Writing {} to page {DEMO_PAGE}",
            display::hex_bytes(&DEMO_DATA)
        ))
    );
    let response = session.execute(&ultralight::write(DEMO_PAGE, &DEMO_DATA)?)?;
    println!("{}", display::response(&response));

    println!("{}", display::success("Demo complete"));
    Ok(())
}
