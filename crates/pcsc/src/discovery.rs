//! Reader enumeration and selection

use tracing::{debug, info, warn};

use crate::backend::ReaderContext;
use crate::{Error, Result};

/// Name of a reader as reported by the resource manager
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    derive_more::Deref,
    derive_more::From,
)]
pub struct ReaderName(String);

impl ReaderName {
    /// Create a reader name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReaderName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Which reader a session connects to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReaderSelector {
    /// First reader in resource manager order
    #[default]
    First,
    /// Reader with exactly this name
    Named(String),
    /// First reader whose name contains this text
    Containing(String),
}

impl ReaderSelector {
    /// Pick a reader from a listing
    pub fn select<'a>(&self, readers: &'a [ReaderName]) -> Result<&'a ReaderName> {
        let found = match self {
            Self::First => readers.first(),
            Self::Named(name) => readers.iter().find(|r| r.as_str() == name),
            Self::Containing(part) => readers.iter().find(|r| r.contains(part.as_str())),
        };

        found.ok_or_else(|| match self {
            Self::First => Error::NoReadersFound(None),
            Self::Named(name) | Self::Containing(name) => Error::ReaderNotFound(name.clone()),
        })
    }
}

/// List readers in the order the resource manager reports them
///
/// An empty listing and a failed listing both yield [`Error::NoReadersFound`].
pub fn list_readers<X: ReaderContext>(context: &X) -> Result<Vec<ReaderName>> {
    let readers = context.list_readers().map_err(|err| {
        warn!(error = %err, "Failed to list readers");
        Error::NoReadersFound(Some(err))
    })?;

    if readers.is_empty() {
        return Err(Error::NoReadersFound(None));
    }

    debug!(count = readers.len(), "Found readers");
    for reader in &readers {
        debug!(reader = %reader, "Reader available");
    }
    Ok(readers.into_iter().map(ReaderName::from).collect())
}

/// List readers and pick one with `selector`
pub fn select_reader<X: ReaderContext>(
    context: &X,
    selector: &ReaderSelector,
) -> Result<ReaderName> {
    let readers = list_readers(context)?;
    let reader = selector.select(&readers)?.clone();
    info!(reader = %reader, "Reader found");
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::backend::ResourceManager;
    use crate::mock::{FailPoint, MockReader};

    /// Log sink shared with the subscriber under test
    #[derive(Debug, Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    const READERS: [&str; 3] = [
        "Gemalto PC Twin Reader 00 00",
        "ACS ACR122U PICC Interface 01 00",
        "ACS ACR122U PICC Interface 02 00",
    ];

    #[test]
    fn test_list_preserves_order() {
        let mock = MockReader::ultralight().with_readers(&READERS);
        let context = mock.establish(pcsc::Scope::User).unwrap();

        let readers = list_readers(&context).unwrap();
        let names: Vec<&str> = readers.iter().map(ReaderName::as_str).collect();
        assert_eq!(names, READERS);
    }

    #[test]
    fn test_list_logs_every_reader() {
        let mock = MockReader::ultralight().with_readers(&READERS);
        let context = mock.establish(pcsc::Scope::User).unwrap();

        let output = Captured::default();
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, || list_readers(&context)).unwrap();

        let logs = output.contents();
        for reader in READERS {
            assert!(logs.contains(reader), "{reader} missing from {logs}");
        }
    }

    #[test]
    fn test_list_empty() {
        let mock = MockReader::ultralight().with_readers(&[]);
        let context = mock.establish(pcsc::Scope::User).unwrap();

        assert!(matches!(
            list_readers(&context),
            Err(Error::NoReadersFound(None))
        ));
    }

    #[test]
    fn test_list_failure() {
        let mock = MockReader::ultralight()
            .with_failure(FailPoint::ListReaders, pcsc::Error::NoReadersAvailable);
        let context = mock.establish(pcsc::Scope::User).unwrap();

        assert!(matches!(
            list_readers(&context),
            Err(Error::NoReadersFound(Some(pcsc::Error::NoReadersAvailable)))
        ));
    }

    #[test]
    fn test_selectors() {
        let readers: Vec<ReaderName> = READERS.iter().copied().map(ReaderName::from).collect();

        assert_eq!(ReaderSelector::First.select(&readers).unwrap(), &readers[0]);
        assert_eq!(
            ReaderSelector::Named(READERS[2].to_string())
                .select(&readers)
                .unwrap(),
            &readers[2]
        );
        assert_eq!(
            ReaderSelector::Containing("ACR122".to_string())
                .select(&readers)
                .unwrap(),
            &readers[1]
        );
        assert!(matches!(
            ReaderSelector::Named("ACS".to_string()).select(&readers),
            Err(Error::ReaderNotFound(name)) if name == "ACS"
        ));
        assert!(matches!(
            ReaderSelector::First.select(&[]),
            Err(Error::NoReadersFound(None))
        ));
    }

    #[test]
    fn test_select_reader() {
        let mock = MockReader::ultralight().with_readers(&READERS);
        let context = mock.establish(pcsc::Scope::User).unwrap();

        let reader =
            select_reader(&context, &ReaderSelector::Containing("02 00".to_string())).unwrap();
        assert_eq!(reader.as_str(), READERS[2]);
    }
}
