//! Negotiated protocol and transport header selection

use crate::{Error, Result};

/// Protocol the card settled on when the connection was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NegotiatedProtocol {
    /// Character oriented T=0
    T0,
    /// Block oriented T=1
    T1,
    /// Raw, direct or unknown
    Undefined,
}

impl From<Option<pcsc::Protocol>> for NegotiatedProtocol {
    fn from(protocol: Option<pcsc::Protocol>) -> Self {
        match protocol {
            Some(pcsc::Protocol::T0) => Self::T0,
            Some(pcsc::Protocol::T1) => Self::T1,
            _ => Self::Undefined,
        }
    }
}

/// Protocol control information sent ahead of every APDU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportHeader {
    /// T=0 header
    T0,
    /// T=1 header
    T1,
}

impl TransportHeader {
    /// Header for a negotiated protocol
    ///
    /// Fails with [`Error::Protocol`] when the protocol has no header.
    pub const fn for_protocol(protocol: NegotiatedProtocol) -> Result<Self> {
        match protocol {
            NegotiatedProtocol::T0 => Ok(Self::T0),
            NegotiatedProtocol::T1 => Ok(Self::T1),
            NegotiatedProtocol::Undefined => Err(Error::Protocol(protocol)),
        }
    }

    /// The resource manager protocol this header belongs to
    pub const fn protocol(self) -> pcsc::Protocol {
        match self {
            Self::T0 => pcsc::Protocol::T0,
            Self::T1 => pcsc::Protocol::T1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pcsc_protocol() {
        assert_eq!(
            NegotiatedProtocol::from(Some(pcsc::Protocol::T0)),
            NegotiatedProtocol::T0
        );
        assert_eq!(
            NegotiatedProtocol::from(Some(pcsc::Protocol::T1)),
            NegotiatedProtocol::T1
        );
        assert_eq!(
            NegotiatedProtocol::from(Some(pcsc::Protocol::RAW)),
            NegotiatedProtocol::Undefined
        );
        assert_eq!(NegotiatedProtocol::from(None), NegotiatedProtocol::Undefined);
    }

    #[test]
    fn test_header_selection() {
        assert_eq!(
            TransportHeader::for_protocol(NegotiatedProtocol::T0).unwrap(),
            TransportHeader::T0
        );
        assert_eq!(
            TransportHeader::for_protocol(NegotiatedProtocol::T1).unwrap(),
            TransportHeader::T1
        );
        assert!(matches!(
            TransportHeader::for_protocol(NegotiatedProtocol::Undefined),
            Err(Error::Protocol(NegotiatedProtocol::Undefined))
        ));
    }

    #[test]
    fn test_header_protocol() {
        assert_eq!(TransportHeader::T0.protocol(), pcsc::Protocol::T0);
        assert_eq!(TransportHeader::T1.protocol(), pcsc::Protocol::T1);
    }

    #[test]
    fn test_display() {
        assert_eq!(NegotiatedProtocol::T1.to_string(), "T1");
        assert_eq!(NegotiatedProtocol::Undefined.to_string(), "Undefined");
    }
}
