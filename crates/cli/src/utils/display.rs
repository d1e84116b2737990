//! Display utilities for the cardlink CLI

use cardlink_apdu_core::{Response, StatusWord};
use colored::{ColoredString, Colorize};

/// Status word colored by outcome
pub fn status(status: StatusWord) -> ColoredString {
    let text = format!("{status} ({})", status.description());
    if status.is_success() {
        text.green()
    } else if status.is_warning() {
        text.yellow()
    } else {
        text.red()
    }
}

/// Upper-case hex with a space between bytes
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a decoded response
pub fn response(response: &Response) -> String {
    let mut result = format!("{}: {}", "Status".bold(), status(response.status()));
    if !response.payload().is_empty() {
        result.push_str(&format!(
            "\n{}: {}",
            "Data".bold(),
            hex_bytes(response.payload())
        ));
    }
    result
}

/// Format a key-value section
pub fn key_value_box(title: &str, items: Vec<(&str, String)>) -> String {
    let mut result = format!("{}", title.bold().underline());

    for (key, value) in items {
        result.push_str(&format!("\n  {}: {}", key.bold(), value));
    }

    result
}

/// Format a progress step
pub fn step(message: &str) -> String {
    format!("{} {}", "==>".blue().bold(), message)
}

/// Format a success message
pub fn success(message: &str) -> String {
    message.green().bold().to_string()
}
