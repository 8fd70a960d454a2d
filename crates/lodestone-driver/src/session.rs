//! One reader, one session: connection lifecycle, state, and the loop pair.
//!
//! # Architecture
//!
//! ```text
//!   ReaderController ── spawns ──▶ supervisor task (one per session)
//!                                   │ loop: open → grace → drive → backoff
//!                                   │
//!                          ┌────────┴─────────┐
//!                          ▼ (inline)         ▼ (spawned per connection)
//!                       send loop          listen loop
//!                   commands + ticks     lines → events → callbacks
//! ```
//!
//! The supervisor task owns the command channel receiver and becomes the
//! send loop while a connection is live; the listen loop is spawned per
//! connection and torn down with it. Both halves share one state struct
//! behind a mutex. Critical sections never await, and callbacks are invoked
//! only after the lock is released.
//!
//! Identity is learned, never assumed: the session keeps querying `NAME`
//! until the reader answers, and card/trait events that arrive before the
//! answer are buffered and flushed the moment it does, identity emission
//! first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval, sleep, timeout};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lodestone_core::{
    CardId, Depletion, DeviceName, DevicePath, LinkState, SampleKind,
    constants::{
        COMMAND_CHANNEL_CAPACITY, READ_TIMEOUT_MS, RECONNECT_BACKOFF_MS, SEND_TICK_INTERVAL_MS,
        STARTUP_GRACE_MS,
    },
};
use lodestone_protocol::{Command, Event, LineCodec, validate_trait_args};

use crate::error::{DriverError, Result};
use crate::traits::{PortOpener, ReaderHandler, ReaderPort};

type PortReader = FramedRead<ReadHalf<Box<dyn ReaderPort>>, LineCodec>;
type PortWriter = FramedWrite<WriteHalf<Box<dyn ReaderPort>>, LineCodec>;

/// A point-in-time copy of one session's state.
///
/// Fields are consistent with each other at the moment of the snapshot but
/// go stale immediately; the physical reader is the source of truth.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub path: DevicePath,
    pub link: LinkState,
    pub name: Option<DeviceName>,
    pub card: Option<CardId>,
    pub traits: Option<Vec<String>>,
    pub writing: bool,
}

/// Emissions that arrived before the reader identified itself, held back
/// until the `Name:` line resolves them.
#[derive(Debug, Default)]
struct PendingEmits {
    card: Option<CardId>,
    traits: Option<Vec<String>>,
}

#[derive(Debug)]
struct SessionState {
    link: LinkState,
    name: Option<DeviceName>,
    card: Option<CardId>,
    traits: Option<Vec<String>>,
    writing: bool,
    reread_requested: bool,
    pending: PendingEmits,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            link: LinkState::Disconnected,
            name: None,
            card: None,
            traits: None,
            writing: false,
            reread_requested: false,
            pending: PendingEmits::default(),
        }
    }
}

/// Callback invocations computed under the state lock, delivered after it
/// is released.
enum Emit {
    CardDetected { name: DeviceName, card: CardId },
    CardLost { name: DeviceName, card: CardId },
    TraitsDetected { name: DeviceName, traits: Vec<String> },
}

/// The live binding between one device path and the reader behind it.
///
/// Obtained from the controller (never constructed directly); shared as
/// `Arc<DeviceSession>`. All accessors are cheap reads of the session's
/// state; [`write_sample`](DeviceSession::write_sample) and
/// [`set_name`](DeviceSession::set_name) enqueue commands for the send
/// loop and fail fast when the reader is not connected.
#[derive(Debug)]
pub struct DeviceSession {
    path: DevicePath,
    baud_rate: u32,
    state: Mutex<SessionState>,
    command_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
}

impl DeviceSession {
    pub(crate) fn new(
        path: DevicePath,
        baud_rate: u32,
        cancel: CancellationToken,
    ) -> (Arc<Self>, mpsc::Receiver<Command>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let session = Arc::new(DeviceSession {
            path,
            baud_rate,
            state: Mutex::new(SessionState::default()),
            command_tx,
            cancel,
        });
        (session, command_rx)
    }

    /// The transport endpoint this session drives.
    #[must_use]
    pub fn path(&self) -> &DevicePath {
        &self.path
    }

    /// Current connection state.
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.state().link
    }

    /// The reader's self-reported name, once learned.
    #[must_use]
    pub fn name(&self) -> Option<DeviceName> {
        self.state().name.clone()
    }

    /// The card currently in the reader's field, if any.
    #[must_use]
    pub fn card_id(&self) -> Option<CardId> {
        self.state().card.clone()
    }

    /// The last validated trait list read from the present card.
    #[must_use]
    pub fn traits(&self) -> Option<Vec<String>> {
        self.state().traits.clone()
    }

    /// Whether a write command is awaiting its completion acknowledgment.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.state().writing
    }

    /// Connected and identified: the session is fully usable.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let state = self.state();
        state.link.is_connected() && state.name.is_some()
    }

    /// Copy the whole state under one lock acquisition.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            path: self.path.clone(),
            link: state.link,
            name: state.name.clone(),
            card: state.card.clone(),
            traits: state.traits.clone(),
            writing: state.writing,
        }
    }

    /// Write a sample to the card in the reader's field.
    ///
    /// Validates the trait count for `kind` (RAW 4, REFINED 5, BLOOD 3) and
    /// the depletion-marker pairing (required for RAW, forbidden otherwise)
    /// before anything is sent. On success the command is enqueued, the
    /// `writing` flag is raised until the reader acknowledges, and a trait
    /// re-read is scheduled so the freshly written card is re-validated.
    ///
    /// # Errors
    /// `DriverError::Invalid` for a malformed request,
    /// `DriverError::NotConnected` without a live connection, and
    /// `DriverError::CommandBacklog` if the command channel is full. None
    /// of these send anything or raise `writing`.
    pub fn write_sample(
        &self,
        kind: SampleKind,
        traits: Vec<String>,
        depletion: Option<Depletion>,
    ) -> Result<()> {
        kind.validate_traits(&traits)?;
        kind.validate_depletion(depletion)?;

        let mut state = self.state();
        if !state.link.is_connected() {
            return Err(DriverError::not_connected(&self.path));
        }
        self.command_tx
            .try_send(Command::WriteSample {
                kind,
                traits,
                depletion,
            })
            .map_err(|_| DriverError::command_backlog(&self.path))?;
        state.writing = true;
        state.reread_requested = true;
        Ok(())
    }

    /// Ask the reader to store a new name.
    ///
    /// The local `name` is not touched: the session only believes the
    /// reader's own `Name:` echo, and identity stays immutable for the
    /// lifetime of one connection regardless of what was sent.
    ///
    /// # Errors
    /// `DriverError::NotConnected` without a live connection,
    /// `DriverError::CommandBacklog` if the command channel is full.
    pub fn set_name(&self, name: DeviceName) -> Result<()> {
        let state = self.state();
        if !state.link.is_connected() {
            return Err(DriverError::not_connected(&self.path));
        }
        self.command_tx
            .try_send(Command::SetName { name })
            .map_err(|_| DriverError::command_backlog(&self.path))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_link(&self, link: LinkState) {
        self.state().link = link;
    }

    /// Reset to a blank disconnected state. Identity, card, traits and all
    /// flags are cleared; they must be re-learned on the next connection.
    fn mark_disconnected(&self) {
        *self.state() = SessionState::default();
    }

    /// Supervisor loop: open the port, run the connection, back off, retry.
    ///
    /// This task is the single owner of reconnect scheduling. It runs until
    /// the session's cancellation token fires, which also cancels a backoff
    /// sleep that is still pending.
    pub(crate) async fn run(
        self: Arc<Self>,
        mut command_rx: mpsc::Receiver<Command>,
        opener: Arc<dyn PortOpener>,
        handler: Arc<dyn ReaderHandler>,
    ) {
        debug!(port = %self.path, "session supervisor started");
        while !self.cancel.is_cancelled() {
            match opener.open(&self.path, self.baud_rate).await {
                Ok(port) => {
                    info!(port = %self.path, baud = self.baud_rate, "serial port opened");
                    self.set_link(LinkState::Connecting);
                    // Opening the port reset the reader; let it boot.
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        _ = sleep(Duration::from_millis(STARTUP_GRACE_MS)) => {}
                    }
                    self.set_link(LinkState::Connected);
                    self.drive(port, &mut command_rx, &handler).await;
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    self.discard_stale_commands(&mut command_rx);
                }
                Err(error) => {
                    warn!(port = %self.path, %error, "failed to open serial port");
                }
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = sleep(Duration::from_millis(RECONNECT_BACKOFF_MS)) => {}
            }
        }
        self.mark_disconnected();
        debug!(port = %self.path, "session supervisor stopped");
    }

    /// Run one connection to completion: spawn the listen loop, become the
    /// send loop, and join both when either side tears the connection down.
    async fn drive(
        self: &Arc<Self>,
        port: Box<dyn ReaderPort>,
        command_rx: &mut mpsc::Receiver<Command>,
        handler: &Arc<dyn ReaderHandler>,
    ) {
        let connection = self.cancel.child_token();
        let (read_half, write_half) = tokio::io::split(port);
        let reader = FramedRead::new(read_half, LineCodec::new());
        let writer = FramedWrite::new(write_half, LineCodec::new());

        let listener = tokio::spawn(Arc::clone(self).listen_loop(
            reader,
            Arc::clone(handler),
            connection.clone(),
        ));

        self.send_loop(writer, command_rx, &connection).await;

        connection.cancel();
        if let Err(error) = listener.await {
            warn!(port = %self.path, %error, "listen task failed");
        }
    }

    /// Commands accepted while the connection was live but never sent are
    /// dropped, not carried over to the next connection.
    fn discard_stale_commands(&self, command_rx: &mut mpsc::Receiver<Command>) {
        let mut dropped = 0usize;
        while command_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(port = %self.path, count = dropped, "discarded commands from the lost connection");
        }
    }

    /// Send half: drains enqueued commands and, on a fixed tick, queries
    /// the name while it is unknown and issues a pending trait re-read.
    async fn send_loop(
        &self,
        mut writer: PortWriter,
        command_rx: &mut mpsc::Receiver<Command>,
        connection: &CancellationToken,
    ) {
        let mut tick = interval(Duration::from_millis(SEND_TICK_INTERVAL_MS));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = connection.cancelled() => return,
                command = command_rx.recv() => {
                    let Some(command) = command else { return };
                    if !self.send_command(&mut writer, command, connection).await {
                        return;
                    }
                }
                _ = tick.tick() => {
                    let (query_name, reread) = {
                        let mut state = self.state();
                        let reread = state.reread_requested;
                        state.reread_requested = false;
                        (state.name.is_none(), reread)
                    };
                    if query_name
                        && !self.send_command(&mut writer, Command::QueryName, connection).await
                    {
                        return;
                    }
                    if reread
                        && !self.send_command(&mut writer, Command::ReadAll, connection).await
                    {
                        return;
                    }
                }
            }
        }
    }

    /// Write one command; on failure treat the connection as lost and
    /// return `false`.
    async fn send_command(
        &self,
        writer: &mut PortWriter,
        command: Command,
        connection: &CancellationToken,
    ) -> bool {
        debug!(port = %self.path, command = %command, "sending command");
        match writer.send(command).await {
            Ok(()) => true,
            Err(error) => {
                warn!(port = %self.path, %error, "write failed; dropping the connection");
                self.mark_disconnected();
                connection.cancel();
                false
            }
        }
    }

    /// Listen half: read lines with a bounded timeout, decode, dispatch.
    ///
    /// A timeout with nothing to read is a normal idle poll. A stream error
    /// or end-of-stream is a connection loss: state is reset and the shared
    /// connection token cancelled so the send loop follows.
    async fn listen_loop(
        self: Arc<Self>,
        mut reader: PortReader,
        handler: Arc<dyn ReaderHandler>,
        connection: CancellationToken,
    ) {
        let read_timeout = Duration::from_millis(READ_TIMEOUT_MS);
        loop {
            let polled = tokio::select! {
                biased;
                _ = connection.cancelled() => return,
                polled = timeout(read_timeout, reader.next()) => polled,
            };
            match polled {
                // Idle poll; nothing said for a while.
                Err(_elapsed) => continue,
                Ok(Some(Ok(event))) => self.handle_event(event, handler.as_ref()),
                Ok(Some(Err(error))) => {
                    warn!(port = %self.path, %error, "read failed; dropping the connection");
                    self.mark_disconnected();
                    connection.cancel();
                    return;
                }
                Ok(None) => {
                    warn!(port = %self.path, "stream closed by the device");
                    self.mark_disconnected();
                    connection.cancel();
                    return;
                }
            }
        }
    }

    /// Apply one decoded event and deliver whatever callbacks it produced.
    fn handle_event(&self, event: Event, handler: &dyn ReaderHandler) {
        let emits = {
            let mut state = self.state();
            self.apply_event(&mut state, event)
        };
        for emit in emits {
            match emit {
                Emit::CardDetected { name, card } => handler.card_detected(&name, &card),
                Emit::CardLost { name, card } => handler.card_lost(&name, &card),
                Emit::TraitsDetected { name, traits } => handler.traits_detected(&name, &traits),
            }
        }
    }

    /// The event dispatch table. Runs under the state lock and returns the
    /// emissions to deliver once it is released.
    fn apply_event(&self, state: &mut SessionState, event: Event) -> Vec<Emit> {
        let mut emits = Vec::new();
        match event {
            Event::TagFound { card, args } => {
                debug!(port = %self.path, card = %card, "tag found");
                state.card = Some(card.clone());
                match &state.name {
                    Some(name) => emits.push(Emit::CardDetected {
                        name: name.clone(),
                        card,
                    }),
                    None => state.pending.card = Some(card),
                }
                if validate_trait_args(&args) {
                    state.traits = Some(args.clone());
                    match &state.name {
                        Some(name) => emits.push(Emit::TraitsDetected {
                            name: name.clone(),
                            traits: args,
                        }),
                        None => state.pending.traits = Some(args),
                    }
                } else {
                    warn!(port = %self.path, ?args, "tag read failed validation; requesting a re-read");
                    state.reread_requested = true;
                }
            }
            Event::TagLost { card } => {
                let was_present = state.card.take().is_some();
                state.traits = None;
                state.pending = PendingEmits::default();
                match (&state.name, was_present) {
                    (Some(name), true) => {
                        debug!(port = %self.path, card = %card, "tag lost");
                        emits.push(Emit::CardLost {
                            name: name.clone(),
                            card,
                        });
                    }
                    (None, true) => {
                        debug!(port = %self.path, card = %card, "tag lost before the reader identified itself");
                    }
                    // No present card: the loss was already handled.
                    (_, false) => {
                        debug!(port = %self.path, card = %card, "tag lost with no card present");
                    }
                }
            }
            Event::Traits { args } => {
                if !validate_trait_args(&args) {
                    warn!(port = %self.path, ?args, "trait re-read failed validation");
                } else if state.card.is_none() {
                    debug!(port = %self.path, ?args, "traits with no card present; dropping");
                } else {
                    state.traits = Some(args.clone());
                    match &state.name {
                        Some(name) => emits.push(Emit::TraitsDetected {
                            name: name.clone(),
                            traits: args,
                        }),
                        None => state.pending.traits = Some(args),
                    }
                }
            }
            Event::Name { value } => match DeviceName::new(value) {
                Err(error) => {
                    warn!(port = %self.path, %error, "unusable name announcement");
                }
                Ok(announced) => match &state.name {
                    Some(current) if *current == announced => {
                        debug!(port = %self.path, name = %announced, "name re-announced");
                    }
                    Some(current) => {
                        warn!(
                            port = %self.path,
                            current = %current,
                            announced = %announced,
                            "name change mid-connection ignored"
                        );
                    }
                    None => {
                        info!(port = %self.path, name = %announced, "reader identified");
                        state.name = Some(announced.clone());
                        if let Some(card) = state.pending.card.take() {
                            emits.push(Emit::CardDetected {
                                name: announced.clone(),
                                card,
                            });
                        }
                        if let Some(traits) = state.pending.traits.take() {
                            emits.push(Emit::TraitsDetected {
                                name: announced,
                                traits,
                            });
                        }
                    }
                },
            },
            Event::WriteComplete => {
                debug!(port = %self.path, "write acknowledged");
                state.writing = false;
            }
            Event::Unrecognized { line } => {
                debug!(port = %self.path, line = %line, "unrecognized line");
            }
        }
        emits
    }
}
