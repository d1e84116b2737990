//! Interactive APDU shell for sending commands to a card

use std::io::{self, BufRead, Write};

use cardlink_apdu_core::Response;
use cardlink_pcsc::{PcscConfig, PcscResourceManager, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(&PcscResourceManager, PcscConfig::default())?;
    let connection = session.connection()?;
    println!(
        "Connected to {} using {}",
        connection.reader(),
        connection.protocol()
    );

    println!("\nAPDU Shell - Enter commands in hex format or 'help' for assistance");
    println!("Examples:");
    println!("  FF00480000");
    println!("  FF B0 00 04 10");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(Ok(input)) => input,
            _ => break,
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "q" => break,

            "help" | "?" => {
                println!("Commands:");
                println!("  <hex>     - Send APDU command (e.g., 'FFCA000000')");
                println!("  atr       - Display the card's ATR");
                println!("  help      - Show this help");
                println!("  exit      - Exit the shell");
            }

            "atr" => match session.status() {
                Ok(status) => println!("ATR: {}", hex::encode_upper(status.atr())),
                Err(e) => println!("Error getting ATR: {e}"),
            },

            // Treat as raw APDU
            _ => {
                let command = match hex::decode(input.replace(' ', "")) {
                    Ok(bytes) if bytes.len() >= 4 => bytes,
                    Ok(_) => {
                        println!("APDU command too short");
                        continue;
                    }
                    Err(_) => {
                        println!("Invalid hex input");
                        continue;
                    }
                };

                match session
                    .transmit_raw(&command)
                    .map_err(|e| e.to_string())
                    .and_then(|raw| Response::from_bytes(&raw).map_err(|e| e.to_string()))
                {
                    Ok(response) => {
                        println!("Response:");
                        println!("  Status: {}", response.status());
                        if !response.payload().is_empty() {
                            println!("  Data: {}", hex::encode_upper(response.payload()));
                        }
                    }
                    Err(e) => println!("Command failed: {e}"),
                }
            }
        }
    }

    session.close()?;
    println!("Goodbye!");
    Ok(())
}
