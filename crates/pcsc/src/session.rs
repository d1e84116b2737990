//! Card connection lifecycle

use pcsc::{Disposition, Protocols};
use tracing::{debug, info, instrument, warn};

use crate::backend::{CardHandle, CardStatus, ReaderContext};
use crate::config::ShareMode;
use crate::discovery::ReaderName;
use crate::protocol::NegotiatedProtocol;
use crate::{Error, Result};

/// A live card link
#[derive(Debug)]
pub struct CardConnection<C> {
    card: C,
    reader: ReaderName,
    protocol: NegotiatedProtocol,
}

impl<C> CardConnection<C> {
    /// Backend card handle
    pub const fn card(&self) -> &C {
        &self.card
    }

    /// Reader the card sits in
    pub const fn reader(&self) -> &ReaderName {
        &self.reader
    }

    /// Protocol negotiated at connect time
    pub const fn protocol(&self) -> NegotiatedProtocol {
        self.protocol
    }
}

/// Connection state of a [`CardSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SessionState {
    /// Card link held
    Connected,
    /// Card link released, terminal
    Disconnected,
}

/// Owns one card link and disconnects it exactly once
#[derive(Debug)]
pub struct CardSession<C: CardHandle> {
    connection: Option<CardConnection<C>>,
    disposition: Disposition,
}

impl<C: CardHandle> CardSession<C> {
    /// Connect to the card in `reader`
    ///
    /// `disposition` is applied when the session is dropped without an
    /// explicit [`CardSession::disconnect`].
    #[instrument(level = "debug", skip_all, fields(reader = %reader))]
    pub fn connect<X>(
        context: &X,
        reader: &ReaderName,
        share_mode: ShareMode,
        protocols: Protocols,
        disposition: Disposition,
    ) -> Result<Self>
    where
        X: ReaderContext<Card = C>,
    {
        let (card, protocol) = context
            .connect(reader, share_mode.into(), protocols)
            .map_err(|source| Error::Connection {
                reader: reader.clone(),
                source,
            })?;
        let protocol = NegotiatedProtocol::from(protocol);
        info!(%protocol, "Connected to card");

        Ok(Self {
            connection: Some(CardConnection {
                card,
                reader: reader.clone(),
                protocol,
            }),
            disposition,
        })
    }

    /// Current state
    pub const fn state(&self) -> SessionState {
        if self.connection.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// The live connection
    pub fn connection(&self) -> Result<&CardConnection<C>> {
        self.connection.as_ref().ok_or(Error::NotConnected)
    }

    /// Query the card's status
    pub fn status(&self) -> Result<CardStatus> {
        let status = self.connection()?.card.status().map_err(Error::Status)?;
        if status.atr().len() > pcsc::MAX_ATR_SIZE {
            return Err(Error::InvalidAtr(status.atr().len()));
        }

        debug!(atr = %hex::encode(status.atr()), state = ?status.state(), "Card status");
        Ok(status)
    }

    /// Release the card link with `disposition`
    ///
    /// The link is given up even when the resource manager reports an error,
    /// so a session is never disconnected twice. Once disconnected this is a
    /// no-op.
    pub fn disconnect(&mut self, disposition: Disposition) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        debug!(reader = %connection.reader, "Disconnecting from card");
        connection
            .card
            .disconnect(disposition)
            .map_err(Error::Disconnect)?;
        info!("Disconnected from card");
        Ok(())
    }
}

impl<C: CardHandle> Drop for CardSession<C> {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect(self.disposition) {
            warn!(error = %e, "Failed to disconnect from card on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ResourceManager;
    use crate::mock::{FailPoint, MockCard, MockContext, MockReader};

    fn connect(mock: &MockReader, context: &MockContext) -> Result<CardSession<MockCard>> {
        CardSession::connect(
            context,
            &ReaderName::new(mock.reader_name()),
            ShareMode::Shared,
            Protocols::T0 | Protocols::T1,
            Disposition::LeaveCard,
        )
    }

    #[test]
    fn test_connect_records_protocol() {
        let mock = MockReader::ultralight().with_protocol(Some(pcsc::Protocol::T0));
        let context = mock.establish(pcsc::Scope::User).unwrap();

        let session = connect(&mock, &context).unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        let connection = session.connection().unwrap();
        assert_eq!(connection.protocol(), NegotiatedProtocol::T0);
        assert_eq!(connection.reader().as_str(), mock.reader_name());
    }

    #[test]
    fn test_connect_failure() {
        let mock =
            MockReader::ultralight().with_failure(FailPoint::Connect, pcsc::Error::NoSmartcard);
        let context = mock.establish(pcsc::Scope::User).unwrap();

        match connect(&mock, &context) {
            Err(Error::Connection { reader, source }) => {
                assert_eq!(reader.as_str(), mock.reader_name());
                assert_eq!(source, pcsc::Error::NoSmartcard);
            }
            other => panic!("expected connection error, got {other:?}"),
        }
        assert_eq!(mock.calls().disconnect, 0);
    }

    #[test]
    fn test_status() {
        let mock = MockReader::ultralight();
        let context = mock.establish(pcsc::Scope::User).unwrap();
        let session = connect(&mock, &context).unwrap();

        let status = session.status().unwrap();
        assert_eq!(status.reader_name(), mock.reader_name());
        assert_eq!(status.protocol(), NegotiatedProtocol::T1);
        assert_eq!(&status.atr()[..4], &[0x3B, 0x8F, 0x80, 0x01]);
        assert!(status.state().contains(pcsc::Status::PRESENT));
    }

    #[test]
    fn test_status_rejects_long_atr() {
        let mock = MockReader::ultralight().with_atr(&[0x3B; 34]);
        let context = mock.establish(pcsc::Scope::User).unwrap();
        let session = connect(&mock, &context).unwrap();

        assert!(matches!(session.status(), Err(Error::InvalidAtr(34))));
    }

    #[test]
    fn test_status_failure() {
        let mock =
            MockReader::ultralight().with_failure(FailPoint::Status, pcsc::Error::InvalidHandle);
        let context = mock.establish(pcsc::Scope::User).unwrap();
        let session = connect(&mock, &context).unwrap();

        assert!(matches!(
            session.status(),
            Err(Error::Status(pcsc::Error::InvalidHandle))
        ));
    }

    #[test]
    fn test_disconnect_once() {
        let mock = MockReader::ultralight();
        let context = mock.establish(pcsc::Scope::User).unwrap();
        let mut session = connect(&mock, &context).unwrap();

        session.disconnect(Disposition::ResetCard).unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(matches!(session.connection(), Err(Error::NotConnected)));

        session.disconnect(Disposition::ResetCard).unwrap();
        drop(session);

        assert_eq!(mock.calls().disconnect, 1);
        assert!(matches!(mock.last_disposition(), Some(Disposition::ResetCard)));
    }

    #[test]
    fn test_disconnect_on_drop() {
        let mock = MockReader::ultralight();
        let context = mock.establish(pcsc::Scope::User).unwrap();

        drop(connect(&mock, &context).unwrap());

        assert_eq!(mock.calls().disconnect, 1);
        assert!(matches!(mock.last_disposition(), Some(Disposition::LeaveCard)));
    }

    #[test]
    fn test_failed_disconnect_not_retried() {
        let mock = MockReader::ultralight()
            .with_failure(FailPoint::Disconnect, pcsc::Error::RemovedCard);
        let context = mock.establish(pcsc::Scope::User).unwrap();
        let mut session = connect(&mock, &context).unwrap();

        assert!(matches!(
            session.disconnect(Disposition::LeaveCard),
            Err(Error::Disconnect(pcsc::Error::RemovedCard))
        ));
        drop(session);
        assert_eq!(mock.calls().disconnect, 1);
    }
}
