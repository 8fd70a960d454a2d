//! Session-managed driver for serial krystallium sample readers.
//!
//! This crate turns the line protocol from `lodestone-protocol` into live
//! reader sessions: it discovers serial ports, keeps one supervised session
//! per port through disconnects and replugs, learns each reader's announced
//! name, and surfaces card activity through [`ReaderHandler`] callbacks
//! keyed by that name.
//!
//! # Architecture
//!
//! ```text
//! ReaderController ──▶ discovery scan ──▶ registry: path → session
//!        │
//!        └─▶ DeviceSession (one per path)
//!                │  supervisor: open → grace → loops → backoff → retry
//!                ├─ send loop:   NAME / READ ALL / WRITESAMPLE ...
//!                └─ listen loop: Tag found / Traits / Name / Write complete
//!                       └─▶ ReaderHandler callbacks (by reader name)
//! ```
//!
//! Sessions are addressed two ways: by device path (the registry key, not
//! stable across replugs) and by the name the reader announces for itself
//! (stable, and the key consumers should use). Callbacks carry the name, so
//! consumers never deal in paths.
//!
//! # Examples
//!
//! Attach one known port, wait for the reader to identify itself, write a
//! sample:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use lodestone_core::{DevicePath, SampleKind};
//! use lodestone_driver::{ControllerConfig, ReaderController, ReaderHandler};
//!
//! struct Quiet;
//!
//! impl ReaderHandler for Quiet {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = ReaderController::new(ControllerConfig::default(), Arc::new(Quiet));
//!     let session = controller.attach(DevicePath::new("/dev/ttyUSB0")?)?;
//!
//!     while !session.is_ready() {
//!         tokio::time::sleep(Duration::from_millis(100)).await;
//!     }
//!     session.write_sample(
//!         SampleKind::Blood,
//!         vec!["Increasing".into(), "Krystal".into(), "Weak".into()],
//!         None,
//!     )?;
//!
//!     controller.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! For discovery-driven operation see [`ReaderController::start`]. Tests run
//! against the in-memory transport in [`mock`] instead of real ports.

pub mod controller;
pub mod error;
pub mod mock;
pub mod scanner;
pub mod session;
pub mod traits;
pub mod transport;

// Re-export the types a typical consumer touches.
pub use controller::{ControllerConfig, ReaderController};
pub use error::{DriverError, Result};
pub use scanner::{DiscoveryConfig, scan_ports};
pub use session::{DeviceSession, SessionSnapshot};
pub use traits::{PortOpener, ReaderHandler, ReaderPort};
pub use transport::SerialOpener;
