//! Configuration options for PC/SC sessions

use pcsc::{Disposition, Protocols, Scope};

use crate::channel::DEFAULT_CAPACITY;
use crate::discovery::ReaderSelector;

/// Sharing mode for card connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    /// Exclusive access to the card
    Exclusive,
    /// Shared access to the card (default)
    Shared,
    /// Direct connection to the reader
    Direct,
}

impl From<ShareMode> for pcsc::ShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Exclusive => Self::Exclusive,
            ShareMode::Shared => Self::Shared,
            ShareMode::Direct => Self::Direct,
        }
    }
}

/// Configuration options for a PC/SC session
#[derive(Debug, Clone)]
pub struct PcscConfig {
    /// Resource manager scope
    ///
    /// Defaults to [`Scope::User`]. pcsc-lite treats both scopes alike, and on
    /// Windows a user-scope context needs no elevated rights, so
    /// [`Scope::System`] is only used when asked for.
    pub scope: Scope,

    /// Sharing mode for card connections
    pub share_mode: ShareMode,

    /// Protocols offered when connecting
    pub protocols: Protocols,

    /// What happens to the card when the session lets go of it
    pub disposition: Disposition,

    /// Response buffer size in bytes
    pub response_capacity: usize,

    /// Which reader to connect to
    pub reader: ReaderSelector,
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self {
            scope: Scope::User,
            share_mode: ShareMode::Shared,
            protocols: Protocols::T0 | Protocols::T1,
            disposition: Disposition::LeaveCard,
            response_capacity: DEFAULT_CAPACITY,
            reader: ReaderSelector::First,
        }
    }
}

impl PcscConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource manager scope
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the offered protocols
    pub const fn with_protocols(mut self, protocols: Protocols) -> Self {
        self.protocols = protocols;
        self
    }

    /// Set the disconnect disposition
    pub const fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Set the response buffer size
    pub const fn with_response_capacity(mut self, capacity: usize) -> Self {
        self.response_capacity = capacity;
        self
    }

    /// Set the reader selector
    pub fn with_reader(mut self, reader: ReaderSelector) -> Self {
        self.reader = reader;
        self
    }
}
