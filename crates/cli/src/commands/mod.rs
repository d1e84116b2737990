//! Command handlers for the cardlink CLI

mod classic;
mod demo;
mod reader;
mod ultralight;

pub use classic::*;
pub use demo::*;
pub use reader::*;
pub use ultralight::*;
