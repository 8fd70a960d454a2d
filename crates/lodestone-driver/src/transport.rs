//! Production serial transport.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio_serial::SerialPortBuilderExt;
use tracing::debug;

use lodestone_core::{DevicePath, constants::READ_TIMEOUT_MS};

use crate::traits::{PortOpener, ReaderPort};

/// Opens real serial ports via `tokio-serial`.
///
/// Opening the port toggles DTR on most USB-serial adapters, which resets
/// the reader's microcontroller; the session waits out a startup grace
/// before talking to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialOpener;

#[async_trait]
impl PortOpener for SerialOpener {
    async fn open(&self, path: &DevicePath, baud_rate: u32) -> io::Result<Box<dyn ReaderPort>> {
        debug!(port = %path, baud = baud_rate, "opening serial port");
        let stream = tokio_serial::new(path.as_str(), baud_rate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open_native_async()
            .map_err(io::Error::other)?;
        Ok(Box::new(stream) as Box<dyn ReaderPort>)
    }
}
