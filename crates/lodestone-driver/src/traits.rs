//! The driver's two seams: where bytes come from and where events go.
//!
//! Sessions drive any [`ReaderPort`] the same way, so tests swap the serial
//! transport for an in-memory duplex pipe by injecting a different
//! [`PortOpener`]. Consumers receive card activity through a
//! [`ReaderHandler`] they supply when the controller is built.
//!
//! `PortOpener` uses the `async_trait` macro rather than a native `async fn`
//! so it stays object-safe: the controller holds it as `Arc<dyn PortOpener>`
//! and calls it from spawned session tasks.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use lodestone_core::{CardId, DeviceName, DevicePath};

/// A byte stream a session can drive: anything async-readable and
/// -writable that can cross task boundaries.
///
/// Blanket-implemented; `tokio_serial::SerialStream` and
/// `tokio::io::DuplexStream` both qualify.
pub trait ReaderPort: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> ReaderPort for T {}

/// Opens the transport behind a device path.
///
/// The production implementation is
/// [`SerialOpener`](crate::transport::SerialOpener); tests use
/// [`MockOpener`](crate::mock::MockOpener).
#[async_trait]
pub trait PortOpener: Send + Sync {
    /// Open the port at `path`.
    ///
    /// # Errors
    /// Any I/O error; the supervisor logs it and retries after its backoff,
    /// so implementations should not retry internally.
    async fn open(&self, path: &DevicePath, baud_rate: u32) -> io::Result<Box<dyn ReaderPort>>;
}

/// Card activity callbacks, keyed by the reader's self-reported name.
///
/// All methods default to no-ops so consumers implement only what they
/// watch. Calls arrive on session tasks with no lock held, but a slow
/// handler still stalls that session's listen loop; hand off anything
/// heavyweight.
///
/// A callback never fires before the reader has identified itself: events
/// that arrive earlier are buffered and flushed once the name is known.
pub trait ReaderHandler: Send + Sync {
    /// A card entered the reader's field.
    fn card_detected(&self, reader: &DeviceName, card: &CardId) {
        let _ = (reader, card);
    }

    /// The card left the reader's field.
    fn card_lost(&self, reader: &DeviceName, card: &CardId) {
        let _ = (reader, card);
    }

    /// A validated trait list was read from the present card.
    ///
    /// `traits` is the full echoed token list, sample kind tag first.
    fn traits_detected(&self, reader: &DeviceName, traits: &[String]) {
        let _ = (reader, traits);
    }
}
