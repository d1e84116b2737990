//! In-memory resource manager emulating a contactless reader
//!
//! [`MockReader`] stands in for [`PcscResourceManager`](crate::PcscResourceManager)
//! in tests: it answers the ACR122 firmware and UID commands, keeps Ultralight
//! or Classic memory, counts every backend call and can fail any of them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use cardlink_mifare::classic;
use pcsc::{Disposition, Protocol, Protocols, Scope};

use crate::backend::{CardHandle, CardStatus, ReaderContext, ResourceManager};
use crate::protocol::TransportHeader;

const READER_NAME: &str = "ACS ACR122U PICC Interface 00 00";
const ULTRALIGHT_ATR: [u8; 20] = [
    0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06, 0x03, 0x00, 0x03,
    0x00, 0x00, 0x00, 0x00, 0x68,
];
const CLASSIC_ATR: [u8; 20] = [
    0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06, 0x03, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x6A,
];
const UID: [u8; 7] = [0x04, 0x52, 0x8B, 0x1A, 0x3C, 0x5E, 0x80];
const MEMORY_SIZE: usize = 1024;

const SW_SUCCESS: [u8; 2] = [0x90, 0x00];
const SW_FAILED: [u8; 2] = [0x63, 0x00];
const SW_SECURITY: [u8; 2] = [0x69, 0x82];
const SW_INS_NOT_SUPPORTED: [u8; 2] = [0x6D, 0x00];

/// Backend call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// [`ResourceManager::establish`]
    Establish,
    /// [`ReaderContext::list_readers`]
    ListReaders,
    /// [`ReaderContext::connect`]
    Connect,
    /// [`CardHandle::status`]
    Status,
    /// [`CardHandle::transmit`]
    Transmit,
    /// [`CardHandle::disconnect`]
    Disconnect,
    /// [`ReaderContext::release`]
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardKind {
    Ultralight,
    Classic,
}

impl CardKind {
    const fn unit(self) -> usize {
        match self {
            Self::Ultralight => 4,
            Self::Classic => 16,
        }
    }
}

/// Number of calls made to each backend operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CallCounts {
    pub establish: usize,
    pub release: usize,
    pub list_readers: usize,
    pub connect: usize,
    pub status: usize,
    pub transmit: usize,
    pub disconnect: usize,
}

#[derive(Debug)]
struct MockState {
    kind: CardKind,
    readers: Vec<String>,
    protocol: Option<Protocol>,
    atr: Vec<u8>,
    firmware: Vec<u8>,
    memory: Vec<u8>,
    card_key: [u8; classic::KEY_SIZE],
    loaded_key: Option<Vec<u8>>,
    authenticated_sector: Option<u8>,
    failure: Option<(FailPoint, pcsc::Error)>,
    oversized_response: Option<usize>,
    calls: CallCounts,
    commands: Vec<Vec<u8>>,
    headers: Vec<TransportHeader>,
    last_disposition: Option<Disposition>,
}

impl MockState {
    fn check(&self, point: FailPoint) -> Result<(), pcsc::Error> {
        match self.failure {
            Some((failing, err)) if failing == point => Err(err),
            _ => Ok(()),
        }
    }

    fn respond(&mut self, apdu: &[u8]) -> Vec<u8> {
        match apdu {
            [0xFF, 0x00, 0x48, 0x00, 0x00] => reply(&self.firmware, SW_SUCCESS),
            [0xFF, 0xCA, 0x00, 0x00, 0x00] => reply(&UID, SW_SUCCESS),
            [0xFF, 0x82, 0x00, 0x00, 0x06, key @ ..] if key.len() == classic::KEY_SIZE => {
                self.loaded_key = Some(key.to_vec());
                SW_SUCCESS.to_vec()
            }
            [0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00, block, 0x60 | 0x61, 0x00] => {
                if self.kind == CardKind::Classic
                    && self.loaded_key.as_deref() == Some(&self.card_key[..])
                {
                    self.authenticated_sector = Some(classic::sector_of(*block));
                    SW_SUCCESS.to_vec()
                } else {
                    self.authenticated_sector = None;
                    SW_FAILED.to_vec()
                }
            }
            [0xFF, 0xB0, 0x00, address, le] => {
                if !self.may_access(*address) {
                    return SW_SECURITY.to_vec();
                }
                let start = usize::from(*address) * self.kind.unit();
                match self.memory.get(start..start + usize::from(*le)) {
                    Some(data) => reply(data, SW_SUCCESS),
                    None => SW_FAILED.to_vec(),
                }
            }
            [0xFF, 0xD6, 0x00, address, lc, data @ ..] if usize::from(*lc) == data.len() => {
                if !self.may_access(*address) {
                    return SW_SECURITY.to_vec();
                }
                if data.len() != self.kind.unit() {
                    return SW_FAILED.to_vec();
                }
                let start = usize::from(*address) * self.kind.unit();
                match self.memory.get_mut(start..start + data.len()) {
                    Some(target) => {
                        target.copy_from_slice(data);
                        SW_SUCCESS.to_vec()
                    }
                    None => SW_FAILED.to_vec(),
                }
            }
            _ => SW_INS_NOT_SUPPORTED.to_vec(),
        }
    }

    fn may_access(&self, address: u8) -> bool {
        match self.kind {
            CardKind::Ultralight => true,
            CardKind::Classic => self.authenticated_sector == Some(classic::sector_of(address)),
        }
    }
}

fn reply(payload: &[u8], status: [u8; 2]) -> Vec<u8> {
    let mut response = payload.to_vec();
    response.extend_from_slice(&status);
    response
}

/// Emulated reader with a single card present
#[derive(Debug, Clone)]
pub struct MockReader {
    state: Arc<Mutex<MockState>>,
}

impl MockReader {
    fn new(kind: CardKind, atr: &[u8]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                kind,
                readers: vec![READER_NAME.to_string()],
                protocol: Some(Protocol::T1),
                atr: atr.to_vec(),
                firmware: b"ACR122U215".to_vec(),
                memory: vec![0; MEMORY_SIZE],
                card_key: classic::DEFAULT_KEY,
                loaded_key: None,
                authenticated_sector: None,
                failure: None,
                oversized_response: None,
                calls: CallCounts::default(),
                commands: Vec::new(),
                headers: Vec::new(),
                last_disposition: None,
            })),
        }
    }

    /// Reader holding a MIFARE Ultralight
    pub fn ultralight() -> Self {
        Self::new(CardKind::Ultralight, &ULTRALIGHT_ATR)
    }

    /// Reader holding a MIFARE Classic 1K with factory keys
    pub fn classic() -> Self {
        Self::new(CardKind::Classic, &CLASSIC_ATR)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the reader list
    pub fn with_readers(self, readers: &[&str]) -> Self {
        self.lock().readers = readers.iter().map(ToString::to_string).collect();
        self
    }

    /// Protocol reported at connect time
    pub fn with_protocol(self, protocol: Option<Protocol>) -> Self {
        self.lock().protocol = protocol;
        self
    }

    /// Answer To Reset reported by status queries
    pub fn with_atr(self, atr: &[u8]) -> Self {
        self.lock().atr = atr.to_vec();
        self
    }

    /// Firmware string returned by the reader
    pub fn with_firmware(self, firmware: &[u8]) -> Self {
        self.lock().firmware = firmware.to_vec();
        self
    }

    /// Fail every call at `point` with `error`
    pub fn with_failure(self, point: FailPoint, error: pcsc::Error) -> Self {
        self.lock().failure = Some((point, error));
        self
    }

    /// Answer every command with `length` bytes, whatever the buffer size
    pub fn with_oversized_response(self, length: usize) -> Self {
        self.lock().oversized_response = Some(length);
        self
    }

    /// First reader name
    pub fn reader_name(&self) -> String {
        self.lock()
            .readers
            .first()
            .cloned()
            .unwrap_or_else(|| READER_NAME.to_string())
    }

    /// Calls made so far
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Every APDU transmitted, in order
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.lock().commands.clone()
    }

    /// Transport header of every transmission
    pub fn headers(&self) -> Vec<TransportHeader> {
        self.lock().headers.clone()
    }

    /// Disposition passed to the last disconnect
    pub fn last_disposition(&self) -> Option<Disposition> {
        self.lock().last_disposition
    }
}

impl ResourceManager for MockReader {
    type Context = MockContext;

    fn establish(&self, _scope: Scope) -> Result<Self::Context, pcsc::Error> {
        let mut state = self.lock();
        state.calls.establish += 1;
        state.check(FailPoint::Establish)?;
        Ok(MockContext {
            reader: self.clone(),
        })
    }
}

/// Context established on a [`MockReader`]
#[derive(Debug)]
pub struct MockContext {
    reader: MockReader,
}

impl ReaderContext for MockContext {
    type Card = MockCard;

    fn list_readers(&self) -> Result<Vec<String>, pcsc::Error> {
        let mut state = self.reader.lock();
        state.calls.list_readers += 1;
        state.check(FailPoint::ListReaders)?;
        Ok(state.readers.clone())
    }

    fn connect(
        &self,
        reader: &str,
        _share_mode: pcsc::ShareMode,
        _protocols: Protocols,
    ) -> Result<(Self::Card, Option<Protocol>), pcsc::Error> {
        let mut state = self.reader.lock();
        state.calls.connect += 1;
        state.check(FailPoint::Connect)?;
        if !state.readers.iter().any(|name| name == reader) {
            return Err(pcsc::Error::UnknownReader);
        }

        let card = MockCard {
            reader: self.reader.clone(),
            name: reader.to_string(),
        };
        Ok((card, state.protocol))
    }

    fn release(self) -> Result<(), pcsc::Error> {
        let mut state = self.reader.lock();
        state.calls.release += 1;
        state.check(FailPoint::Release)
    }
}

/// Card connected through a [`MockContext`]
#[derive(Debug)]
pub struct MockCard {
    reader: MockReader,
    name: String,
}

impl CardHandle for MockCard {
    fn status(&self) -> Result<CardStatus, pcsc::Error> {
        let mut state = self.reader.lock();
        state.calls.status += 1;
        state.check(FailPoint::Status)?;
        Ok(CardStatus::new(
            self.name.clone(),
            pcsc::Status::PRESENT | pcsc::Status::POWERED | pcsc::Status::SPECIFIC,
            state.protocol,
            state.atr.clone(),
        ))
    }

    fn transmit(
        &self,
        header: TransportHeader,
        command: &[u8],
        _capacity: usize,
    ) -> Result<Bytes, pcsc::Error> {
        let mut state = self.reader.lock();
        state.calls.transmit += 1;
        state.check(FailPoint::Transmit)?;
        state.commands.push(command.to_vec());
        state.headers.push(header);

        let oversized = state.oversized_response;
        let response = match oversized {
            Some(length) => reply(&vec![0; length.saturating_sub(2)], SW_SUCCESS),
            None => state.respond(command),
        };
        Ok(Bytes::from(response))
    }

    fn disconnect(self, disposition: Disposition) -> Result<(), pcsc::Error> {
        let mut state = self.reader.lock();
        state.calls.disconnect += 1;
        state.last_disposition = Some(disposition);
        state.check(FailPoint::Disconnect)
    }
}
