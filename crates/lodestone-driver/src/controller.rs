//! Reader fleet coordination.
//!
//! The controller owns the session registry: it discovers serial ports on a
//! fixed cadence, adopts every new match by spawning a supervised session,
//! and answers lookups by path or by announced name. Sessions are never
//! dropped on disconnect; their supervisors keep retrying until the
//! controller stops.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   scan every 5s   ┌──────────────┐
//! │ discovery scan │──────────────────►│   registry   │
//! │ (/dev/ttyUSB*) │   adopt new paths │ path→session │
//! └────────────────┘                   └──────┬───────┘
//!                                             │ spawn (once per path)
//!                                             ▼
//!                                  session supervisor tasks
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lodestone_core::{
    DeviceName, DevicePath,
    constants::{DEFAULT_BAUD_RATE, SCAN_INTERVAL_MS},
};

use crate::error::{DriverError, Result};
use crate::scanner::{DiscoveryConfig, scan_ports};
use crate::session::DeviceSession;
use crate::traits::{PortOpener, ReaderHandler};
use crate::transport::SerialOpener;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Where and what to scan for candidate reader ports.
    pub discovery: DiscoveryConfig,

    /// Baud rate used for every opened port.
    pub baud_rate: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            discovery: DiscoveryConfig::default(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

struct SessionEntry {
    session: Arc<DeviceSession>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<DevicePath, SessionEntry>,
    scan_task: Option<JoinHandle<()>>,
    stopped: bool,
}

/// Coordinates every reader session behind one registry.
///
/// # Lifecycle
///
/// 1. Create with [`ReaderController::new`] and a callback handler.
/// 2. Call [`start`](ReaderController::start) for automatic discovery, or
///    [`attach`](ReaderController::attach) specific paths by hand. Both can
///    be combined.
/// 3. Look sessions up with [`device_by_name`](ReaderController::device_by_name)
///    once readers have identified themselves.
/// 4. Call [`stop`](ReaderController::stop) to cancel every task and wait
///    for them to finish. A stopped controller stays stopped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use lodestone_core::{CardId, DeviceName};
/// use lodestone_driver::{ControllerConfig, ReaderController, ReaderHandler};
///
/// struct PrintHandler;
///
/// impl ReaderHandler for PrintHandler {
///     fn card_detected(&self, reader: &DeviceName, card: &CardId) {
///         println!("{reader}: card {card} entered the field");
///     }
///
///     fn traits_detected(&self, reader: &DeviceName, traits: &[String]) {
///         println!("{reader}: {}", traits.join(" "));
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let controller = ReaderController::new(ControllerConfig::default(), Arc::new(PrintHandler));
///     controller.start();
///
///     tokio::signal::ctrl_c().await.ok();
///     controller.stop().await;
/// }
/// ```
pub struct ReaderController {
    config: ControllerConfig,
    opener: Arc<dyn PortOpener>,
    handler: Arc<dyn ReaderHandler>,
    cancel: CancellationToken,
    registry: Mutex<Registry>,
}

impl ReaderController {
    /// Create a controller that opens real serial ports.
    #[must_use]
    pub fn new(config: ControllerConfig, handler: Arc<dyn ReaderHandler>) -> Arc<Self> {
        Self::with_opener(config, handler, Arc::new(SerialOpener))
    }

    /// Create a controller with a custom transport, e.g. a mock for tests.
    #[must_use]
    pub fn with_opener(
        config: ControllerConfig,
        handler: Arc<dyn ReaderHandler>,
        opener: Arc<dyn PortOpener>,
    ) -> Arc<Self> {
        Arc::new(ReaderController {
            config,
            opener,
            handler,
            cancel: CancellationToken::new(),
            registry: Mutex::new(Registry::default()),
        })
    }

    /// Start periodic port discovery. The first scan runs immediately.
    ///
    /// Calling this again, or after [`stop`](ReaderController::stop), does
    /// nothing.
    pub fn start(self: &Arc<Self>) {
        let mut registry = self.registry();
        if registry.stopped || registry.scan_task.is_some() {
            return;
        }
        debug!(root = %self.config.discovery.root.display(), "starting discovery scans");
        registry.scan_task = Some(tokio::spawn(Arc::clone(self).scan_loop()));
    }

    /// Adopt one path directly, bypassing discovery.
    ///
    /// Idempotent: attaching a path that already has a session returns that
    /// session. The path does not have to exist yet; the session's
    /// supervisor keeps retrying until it does.
    ///
    /// # Errors
    /// `DriverError::ControllerStopped` after [`stop`](ReaderController::stop).
    pub fn attach(&self, path: DevicePath) -> Result<Arc<DeviceSession>> {
        let mut registry = self.registry();
        if let Some(entry) = registry.sessions.get(&path) {
            return Ok(Arc::clone(&entry.session));
        }
        if registry.stopped {
            return Err(DriverError::ControllerStopped);
        }
        Ok(self.spawn_session(&mut registry, path))
    }

    /// Find the session whose reader announced `name`.
    ///
    /// Returns `None` when no reader has that name, and also when more than
    /// one does: names are meant to be unique, and guessing between
    /// duplicates would route commands to an arbitrary reader.
    #[must_use]
    pub fn device_by_name(&self, name: &DeviceName) -> Option<Arc<DeviceSession>> {
        let registry = self.registry();
        let matches: Vec<&Arc<DeviceSession>> = registry
            .sessions
            .values()
            .map(|entry| &entry.session)
            .filter(|session| session.name().as_ref() == Some(name))
            .collect();
        match matches.as_slice() {
            [] => None,
            [session] => Some(Arc::clone(session)),
            several => {
                let paths: Vec<String> = several.iter().map(|s| s.path().to_string()).collect();
                warn!(name = %name, ?paths, "reader name is ambiguous; refusing to pick one");
                None
            }
        }
    }

    /// Every tracked session, in path order.
    #[must_use]
    pub fn devices(&self) -> Vec<Arc<DeviceSession>> {
        let registry = self.registry();
        let mut sessions: Vec<_> = registry
            .sessions
            .values()
            .map(|entry| Arc::clone(&entry.session))
            .collect();
        sessions.sort_by(|a, b| a.path().cmp(b.path()));
        sessions
    }

    /// Cancel every task and wait for all of them to finish.
    ///
    /// Idempotent. After this returns no task of this controller is
    /// running, and [`attach`](ReaderController::attach) is refused.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let (scan_task, entries) = {
            let mut registry = self.registry();
            registry.stopped = true;
            let scan_task = registry.scan_task.take();
            let entries: Vec<SessionEntry> =
                registry.sessions.drain().map(|(_, entry)| entry).collect();
            (scan_task, entries)
        };
        if let Some(task) = scan_task {
            if let Err(error) = task.await {
                warn!(%error, "scan task failed during shutdown");
            }
        }
        for entry in entries {
            if let Err(error) = entry.task.await {
                warn!(port = %entry.session.path(), %error, "session task failed during shutdown");
            }
        }
        debug!("controller stopped");
    }

    async fn scan_loop(self: Arc<Self>) {
        let mut tick = interval(Duration::from_millis(SCAN_INTERVAL_MS));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = tick.tick() => {}
            }
            match scan_ports(&self.config.discovery).await {
                Ok(paths) => self.adopt_paths(paths),
                Err(error) => {
                    warn!(root = %self.config.discovery.root.display(), %error, "discovery scan failed");
                }
            }
        }
    }

    /// Register sessions for paths the registry has not seen yet.
    fn adopt_paths(&self, paths: Vec<DevicePath>) {
        let mut registry = self.registry();
        // The scan ran without the lock; a stop may have landed meanwhile.
        if registry.stopped {
            return;
        }
        for path in paths {
            if !registry.sessions.contains_key(&path) {
                self.spawn_session(&mut registry, path);
            }
        }
    }

    fn spawn_session(&self, registry: &mut Registry, path: DevicePath) -> Arc<DeviceSession> {
        info!(port = %path, "adopting reader");
        let (session, command_rx) =
            DeviceSession::new(path.clone(), self.config.baud_rate, self.cancel.child_token());
        let task = tokio::spawn(Arc::clone(&session).run(
            command_rx,
            Arc::clone(&self.opener),
            Arc::clone(&self.handler),
        ));
        registry.sessions.insert(
            path,
            SessionEntry {
                session: Arc::clone(&session),
                task,
            },
        );
        session
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
