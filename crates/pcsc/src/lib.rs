//! PC/SC session layer for contactless readers
//!
//! This crate drives one card through a PC/SC resource manager: establish a
//! context, pick a reader, connect, exchange APDUs, then disconnect and
//! release. Every acquired handle is released exactly once, whether the
//! session is closed explicitly or dropped after an error.
//!
//! The resource manager sits behind the [`ResourceManager`] seam;
//! [`PcscResourceManager`] talks to the system PC/SC service.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cardlink_pcsc::{PcscConfig, PcscResourceManager, ReaderSelector, Session};
//!
//! let config = PcscConfig::new().with_reader(ReaderSelector::Containing("ACR122".into()));
//! let mut session = Session::open(&PcscResourceManager, config)?;
//!
//! let status = session.status()?;
//! println!("ATR: {}", hex::encode_upper(status.atr()));
//!
//! // Ultralight READ BINARY, four pages from page 4
//! let response = session.transmit_raw(&[0xFF, 0xB0, 0x00, 0x04, 0x10])?;
//! println!("Response: {}", hex::encode_upper(&response));
//!
//! session.close()?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod backend;
mod channel;
mod config;
mod context;
mod controller;
mod discovery;
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod protocol;
mod session;

pub use backend::{
    CardHandle, CardStatus, PcscCard, PcscContext, PcscResourceManager, ReaderContext,
    ResourceManager,
};
pub use channel::{DEFAULT_CAPACITY, TransmissionChannel};
pub use config::{PcscConfig, ShareMode};
pub use context::ContextManager;
pub use controller::Session;
pub use discovery::{ReaderName, ReaderSelector, list_readers, select_reader};
pub use error::{Error, Result, Stage};
pub use protocol::{NegotiatedProtocol, TransportHeader};
pub use session::{CardConnection, CardSession, SessionState};

// Re-export some pcsc types for convenience
pub use pcsc::{Disposition, Protocol, Protocols, Scope, Status};
