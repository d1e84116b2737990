//! Example showing how to enumerate connected card readers

use cardlink_pcsc::{PcscConfig, PcscResourceManager, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Establish a context without connecting to a card
    let session = Session::establish(&PcscResourceManager, PcscConfig::default())?;

    let readers = session.readers()?;
    println!("Found {} readers:", readers.len());

    for (i, reader) in readers.iter().enumerate() {
        println!("{}. Reader: {}", i + 1, reader);
    }

    session.close()?;
    Ok(())
}
