//! APDU exchange over a connected card

use bytes::Bytes;
use cardlink_apdu_core::Command;
use tracing::{trace, warn};

use crate::backend::CardHandle;
use crate::protocol::TransportHeader;
use crate::session::CardConnection;
use crate::{Error, Result};

/// Default response buffer size in bytes
pub const DEFAULT_CAPACITY: usize = 300;

/// Exchanges APDUs through a fixed-size response buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionChannel {
    capacity: usize,
}

impl Default for TransmissionChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TransmissionChannel {
    /// Create a channel with a response buffer of `capacity` bytes
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Response buffer size
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Send raw command bytes and return the raw response, status word included
    ///
    /// The transport header follows the protocol negotiated for `connection`.
    /// An undefined protocol fails before anything reaches the card.
    pub fn transmit_raw<C: CardHandle>(
        &self,
        connection: &CardConnection<C>,
        command: &[u8],
    ) -> Result<Bytes> {
        let header = TransportHeader::for_protocol(connection.protocol())?;
        trace!(command = %hex::encode(command), ?header, "Transmitting");

        let response = connection
            .card()
            .transmit(header, command, self.capacity)
            .map_err(|err| match err {
                pcsc::Error::InsufficientBuffer => Error::ResponseOverflow {
                    capacity: self.capacity,
                    length: None,
                },
                other => Error::Transmission(other),
            })?;

        if response.len() > self.capacity {
            warn!(
                length = response.len(),
                capacity = self.capacity,
                "Response exceeds channel capacity"
            );
            return Err(Error::ResponseOverflow {
                capacity: self.capacity,
                length: Some(response.len()),
            });
        }

        trace!(response = %hex::encode(&response), "Received");
        Ok(response)
    }

    /// Send a command and return the raw response
    pub fn transmit<C: CardHandle>(
        &self,
        connection: &CardConnection<C>,
        command: &Command,
    ) -> Result<Bytes> {
        self.transmit_raw(connection, &command.to_bytes())
    }
}
