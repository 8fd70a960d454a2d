//! Scripted in-memory transport for tests.
//!
//! [`MockOpener`] stands in for the serial layer: every accepted open hands
//! the driver one end of an in-memory duplex pipe and surfaces the other end
//! as a [`MockPortHandle`] through [`MockConnections`]. A test drives the
//! fake reader by feeding lines into the handle and reading back the
//! commands the driver wrote. Dropping the handle closes the pipe, which the
//! driver sees as a connection loss.
//!
//! Open outcomes can be scripted per path; scripts run front to back, and an
//! exhausted or missing script accepts the open.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::sync::mpsc;

use lodestone_core::DevicePath;

use crate::traits::{PortOpener, ReaderPort};

/// What one scripted open attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Hand the driver a live pipe.
    Connect,
    /// Refuse with a not-found error, like an unplugged device.
    Fail,
}

/// A [`PortOpener`] that serves in-memory pipes instead of serial ports.
#[derive(Debug)]
pub struct MockOpener {
    scripts: Mutex<HashMap<DevicePath, VecDeque<OpenOutcome>>>,
    connections: mpsc::UnboundedSender<MockPortHandle>,
}

impl MockOpener {
    /// Create an opener and the stream of connections it will accept.
    #[must_use]
    pub fn new() -> (Arc<Self>, MockConnections) {
        let (connections, rx) = mpsc::unbounded_channel();
        let opener = Arc::new(MockOpener {
            scripts: Mutex::new(HashMap::new()),
            connections,
        });
        (opener, MockConnections { rx })
    }

    /// Queue open outcomes for one path, appended after any already queued.
    pub fn script(&self, path: &DevicePath, outcomes: impl IntoIterator<Item = OpenOutcome>) {
        self.scripts()
            .entry(path.clone())
            .or_default()
            .extend(outcomes);
    }

    fn scripts(&self) -> MutexGuard<'_, HashMap<DevicePath, VecDeque<OpenOutcome>>> {
        self.scripts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PortOpener for MockOpener {
    async fn open(&self, path: &DevicePath, _baud_rate: u32) -> io::Result<Box<dyn ReaderPort>> {
        let outcome = self
            .scripts()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or(OpenOutcome::Connect);
        match outcome {
            OpenOutcome::Fail => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such port: {path}"),
            )),
            OpenOutcome::Connect => {
                let (driver_side, test_side) = tokio::io::duplex(1024);
                let (read_half, write_half) = tokio::io::split(test_side);
                let handle = MockPortHandle {
                    path: path.clone(),
                    lines: BufReader::new(read_half).lines(),
                    writer: write_half,
                };
                // Nobody watching the connection stream is fine; the driver
                // side still works, the handle is just unreachable.
                let _ = self.connections.send(handle);
                Ok(Box::new(driver_side))
            }
        }
    }
}

/// The accepted connections, in open order.
#[derive(Debug)]
pub struct MockConnections {
    rx: mpsc::UnboundedReceiver<MockPortHandle>,
}

impl MockConnections {
    /// Wait for the next accepted open. `None` once the opener is dropped.
    pub async fn next(&mut self) -> Option<MockPortHandle> {
        self.rx.recv().await
    }
}

/// The reader's end of one accepted connection.
///
/// Dropping the handle closes the pipe and disconnects the driver.
#[derive(Debug)]
pub struct MockPortHandle {
    path: DevicePath,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl MockPortHandle {
    /// The path this connection was opened for.
    #[must_use]
    pub fn path(&self) -> &DevicePath {
        &self.path
    }

    /// Print one line to the driver, as the reader firmware would.
    pub async fn feed_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Read the next command line the driver wrote.
    ///
    /// Blank framing lines are skipped. `None` once the driver closed its
    /// end or the pipe broke.
    pub async fn next_command(&mut self) -> Option<String> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(line),
                Ok(None) | Err(_) => return None,
            }
        }
    }
}
