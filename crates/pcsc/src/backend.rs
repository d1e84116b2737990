//! Resource manager seam
//!
//! The session layer talks to PC/SC through three traits mirroring the
//! ownership model of the `pcsc` crate: a manager establishes a context, a
//! context connects cards, and each handle is given up by value exactly once.
//! [`PcscResourceManager`] is the production implementation.

use std::ffi::CString;
use std::{fmt, mem};

use bytes::Bytes;
use pcsc::{Disposition, Protocol, Protocols, Scope};
use tracing::debug;

use crate::protocol::{NegotiatedProtocol, TransportHeader};

/// Entry point to a PC/SC resource manager
pub trait ResourceManager: fmt::Debug {
    /// Context type produced by [`ResourceManager::establish`]
    type Context: ReaderContext;

    /// Establish a context in `scope`
    fn establish(&self, scope: Scope) -> Result<Self::Context, pcsc::Error>;
}

/// An established resource manager context
pub trait ReaderContext: fmt::Debug {
    /// Card handle type produced by [`ReaderContext::connect`]
    type Card: CardHandle;

    /// Names of the readers known to the resource manager, in its order
    fn list_readers(&self) -> Result<Vec<String>, pcsc::Error>;

    /// Connect to the card in `reader`, returning the negotiated protocol
    fn connect(
        &self,
        reader: &str,
        share_mode: pcsc::ShareMode,
        protocols: Protocols,
    ) -> Result<(Self::Card, Option<Protocol>), pcsc::Error>;

    /// Release the context
    fn release(self) -> Result<(), pcsc::Error>;
}

/// A connected card
pub trait CardHandle: fmt::Debug {
    /// Query reader name, state, protocol and ATR
    fn status(&self) -> Result<CardStatus, pcsc::Error>;

    /// Exchange one APDU
    ///
    /// The response must fit in `capacity` bytes.
    fn transmit(
        &self,
        header: TransportHeader,
        command: &[u8],
        capacity: usize,
    ) -> Result<Bytes, pcsc::Error>;

    /// Release the card link
    fn disconnect(self, disposition: Disposition) -> Result<(), pcsc::Error>;
}

/// Snapshot of a connected card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStatus {
    reader_name: String,
    state: pcsc::Status,
    protocol: NegotiatedProtocol,
    atr: Bytes,
}

impl CardStatus {
    /// Create a status snapshot
    pub fn new(
        reader_name: impl Into<String>,
        state: pcsc::Status,
        protocol: impl Into<NegotiatedProtocol>,
        atr: impl Into<Bytes>,
    ) -> Self {
        Self {
            reader_name: reader_name.into(),
            state,
            protocol: protocol.into(),
            atr: atr.into(),
        }
    }

    /// Reader name as reported by the resource manager
    pub fn reader_name(&self) -> &str {
        &self.reader_name
    }

    /// Card state flags
    pub const fn state(&self) -> pcsc::Status {
        self.state
    }

    /// Active protocol
    pub const fn protocol(&self) -> NegotiatedProtocol {
        self.protocol
    }

    /// Answer To Reset
    pub fn atr(&self) -> &[u8] {
        &self.atr
    }
}

/// Resource manager backed by the system PC/SC service
#[derive(Debug, Clone, Copy, Default)]
pub struct PcscResourceManager;

impl ResourceManager for PcscResourceManager {
    type Context = PcscContext;

    fn establish(&self, scope: Scope) -> Result<Self::Context, pcsc::Error> {
        Ok(PcscContext {
            context: pcsc::Context::establish(scope)?,
        })
    }
}

/// Context established with the system PC/SC service
pub struct PcscContext {
    context: pcsc::Context,
}

impl fmt::Debug for PcscContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscContext").finish_non_exhaustive()
    }
}

impl ReaderContext for PcscContext {
    type Card = PcscCard;

    fn list_readers(&self) -> Result<Vec<String>, pcsc::Error> {
        Ok(self
            .context
            .list_readers_owned()?
            .into_iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn connect(
        &self,
        reader: &str,
        share_mode: pcsc::ShareMode,
        protocols: Protocols,
    ) -> Result<(Self::Card, Option<Protocol>), pcsc::Error> {
        let reader = CString::new(reader).map_err(|_| pcsc::Error::UnknownReader)?;
        let card = self.context.connect(&reader, share_mode, protocols)?;
        let protocol = match card.status2_owned() {
            Ok(status) => status.protocol2(),
            Err(err) => {
                // Hand the fresh link back untouched rather than resetting it on drop
                if let Err(disconnect) = settle(card.disconnect(Disposition::LeaveCard)) {
                    debug!(error = %disconnect, "Failed to disconnect after status error");
                }
                return Err(err);
            }
        };
        Ok((PcscCard { card, protocol }, protocol))
    }

    fn release(self) -> Result<(), pcsc::Error> {
        settle(self.context.release())
    }
}

/// Card connected through the system PC/SC service
pub struct PcscCard {
    card: pcsc::Card,
    protocol: Option<Protocol>,
}

impl fmt::Debug for PcscCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscCard")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

impl CardHandle for PcscCard {
    fn status(&self) -> Result<CardStatus, pcsc::Error> {
        let status = self.card.status2_owned()?;
        let reader_name = status
            .reader_names()
            .into_iter()
            .next()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(CardStatus::new(
            reader_name,
            status.status(),
            status.protocol2(),
            Bytes::copy_from_slice(status.atr()),
        ))
    }

    fn transmit(
        &self,
        header: TransportHeader,
        command: &[u8],
        capacity: usize,
    ) -> Result<Bytes, pcsc::Error> {
        // The service picks the PCI from the active protocol, so a header for
        // any other protocol cannot be honored
        if self.protocol != Some(header.protocol()) {
            return Err(pcsc::Error::ProtoMismatch);
        }

        let mut buffer = vec![0; capacity];
        let response = self.card.transmit(command, &mut buffer)?;
        Ok(Bytes::copy_from_slice(response))
    }

    fn disconnect(self, disposition: Disposition) -> Result<(), pcsc::Error> {
        settle(self.card.disconnect(disposition))
    }
}

/// Finish a by-value teardown call of the `pcsc` crate
///
/// On failure `pcsc` returns the handle, and dropping it would repeat the
/// teardown with a fixed `ResetCard` disposition. The handle is leaked instead,
/// so each teardown reaches the service once. A card leaked this way keeps its
/// context alive, and releasing that context then fails with `CantDispose`.
fn settle<T>(outcome: Result<(), (T, pcsc::Error)>) -> Result<(), pcsc::Error> {
    outcome.map_err(|(handle, err)| {
        mem::forget(handle);
        err
    })
}
