//! Owning session over context, card link and channel

use bytes::Bytes;
use cardlink_apdu_core::{Command, Response, StatusError};
use pcsc::Disposition;
use tracing::{debug, instrument, warn};

use crate::backend::{CardStatus, ReaderContext, ResourceManager};
use crate::channel::TransmissionChannel;
use crate::config::PcscConfig;
use crate::context::ContextManager;
use crate::discovery::{self, ReaderName};
use crate::session::{CardConnection, CardSession, SessionState};
use crate::{Error, Result};

type ContextOf<M> = <M as ResourceManager>::Context;
type CardOf<M> = <ContextOf<M> as ReaderContext>::Card;

/// A PC/SC session: one context, at most one card, one exchange at a time
///
/// Dropping the session disconnects the card and then releases the context.
/// [`Session::close`] does the same and reports failures.
#[derive(Debug)]
pub struct Session<M: ResourceManager> {
    // Dropped in declaration order: card before context
    card: Option<CardSession<CardOf<M>>>,
    context: ContextManager<ContextOf<M>>,
    channel: TransmissionChannel,
    config: PcscConfig,
}

impl<M: ResourceManager> Session<M> {
    /// Establish a context without connecting a card
    pub fn establish(manager: &M, config: PcscConfig) -> Result<Self> {
        let context = ContextManager::establish(manager, config.scope)?;
        Ok(Self {
            card: None,
            context,
            channel: TransmissionChannel::new(config.response_capacity),
            config,
        })
    }

    /// Establish a context and connect to the configured reader
    #[instrument(level = "debug", skip_all)]
    pub fn open(manager: &M, config: PcscConfig) -> Result<Self> {
        let mut session = Self::establish(manager, config)?;
        session.connect()?;
        Ok(session)
    }

    /// Session configuration
    pub const fn config(&self) -> &PcscConfig {
        &self.config
    }

    /// Readers known to the resource manager
    pub fn readers(&self) -> Result<Vec<ReaderName>> {
        discovery::list_readers(self.context.context()?)
    }

    /// Connect to the reader picked by the configured selector
    ///
    /// Returns the existing connection when already connected. A session
    /// whose card was disconnected cannot connect again.
    pub fn connect(&mut self) -> Result<&CardConnection<CardOf<M>>> {
        if self.card.is_none() {
            let context = self.context.context()?;
            let reader = discovery::select_reader(context, &self.config.reader)?;
            let card = CardSession::connect(
                context,
                &reader,
                self.config.share_mode,
                self.config.protocols,
                self.config.disposition,
            )?;
            self.card = Some(card);
        }
        self.connection()
    }

    /// The live card connection
    pub fn connection(&self) -> Result<&CardConnection<CardOf<M>>> {
        self.card.as_ref().ok_or(Error::NotConnected)?.connection()
    }

    /// Card connection state
    pub fn state(&self) -> SessionState {
        self.card
            .as_ref()
            .map_or(SessionState::Disconnected, CardSession::state)
    }

    /// Query the connected card's status
    pub fn status(&self) -> Result<CardStatus> {
        self.card.as_ref().ok_or(Error::NotConnected)?.status()
    }

    /// Send raw command bytes and return the raw response
    pub fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes> {
        self.channel.transmit_raw(self.connection()?, command)
    }

    /// Send a command and decode the response, whatever its status word
    pub fn transmit(&mut self, command: &Command) -> Result<Response> {
        let raw = self.channel.transmit(self.connection()?, command)?;
        Ok(Response::from_bytes(&raw)?)
    }

    /// Send a command and require a `90 00` status word
    #[instrument(level = "debug", skip_all, fields(command = %command))]
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        let response = self.transmit(command)?;
        if !response.is_success() {
            warn!(status = %response.status(), "Card rejected command");
            return Err(StatusError {
                status: response.status(),
            }
            .into());
        }
        Ok(response)
    }

    /// Disconnect the card with the configured disposition
    pub fn disconnect(&mut self) -> Result<()> {
        self.disconnect_with(self.config.disposition)
    }

    /// Disconnect the card with `disposition`
    pub fn disconnect_with(&mut self, disposition: Disposition) -> Result<()> {
        match self.card.as_mut() {
            Some(card) => card.disconnect(disposition),
            None => Ok(()),
        }
    }

    /// Disconnect the card, then release the context
    ///
    /// Both steps always run. The first failure is returned.
    pub fn close(self) -> Result<()> {
        let Self {
            card,
            context,
            config,
            ..
        } = self;

        let disconnected = match card {
            Some(mut card) => card.disconnect(config.disposition),
            None => Ok(()),
        };
        let released = context.release();
        debug!("Session closed");

        if let Err(e) = &disconnected {
            warn!(error = %e, "Disconnect failed, context released anyway");
        }
        disconnected.and(released)
    }
}
