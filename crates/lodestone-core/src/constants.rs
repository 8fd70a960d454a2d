//! Core constants for the reader wire protocol and driver timing.
//!
//! This module defines all protocol-level and timing constants used throughout
//! the Lodestone reader driver. Keeping them in one place ensures the codec,
//! the session loops, and the scanner all agree on the wire grammar and on the
//! cadence the physical readers were tuned for.
//!
//! # Wire Format
//!
//! The readers speak newline-terminated ASCII lines in both directions:
//!
//! ```text
//! client → device:   \n<KEYWORD> [ARG ...]\n
//! device → client:   <PREFIX><PAYLOAD>\n
//! ```
//!
//! Every outgoing command is preceded by one bare newline. The reader firmware
//! treats it as a framing guard: whatever half-typed garbage is sitting in its
//! input buffer is terminated and discarded before the real command arrives.
//!
//! # Incoming Line Prefixes
//!
//! | Prefix | Meaning | Payload |
//! |--------|---------|---------|
//! | `Tag found: ` | a card entered the field | card id, then trait tokens |
//! | `Tag lost: ` | the card left the field | card id |
//! | `Traits: ` | answer to `READ ALL` | trait tokens |
//! | `Name:` | answer to `NAME` | the reader's configured name |
//! | `Write complete!` | a `WRITESAMPLE` finished | exact match, no payload |
//!
//! Trait tokens are echoed upper-cased by the firmware; a token that comes
//! back with lower-case characters in it is evidence of a corrupted read.
//!
//! # Usage
//!
//! ```
//! use lodestone_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(PREFIX_TAG_FOUND, "Tag found: ");
//! let backoff = Duration::from_millis(RECONNECT_BACKOFF_MS);
//! assert_eq!(backoff.as_secs(), 5);
//! ```

// ============================================================================
// Outgoing Command Keywords
// ============================================================================

/// Identity command keyword.
///
/// Sent bare (`NAME`) it queries the reader's configured name; with an
/// argument (`NAME <value>`) it reconfigures the name stored on the reader.
pub const CMD_NAME: &str = "NAME";

/// Request a full re-read of the trait tokens on the present card.
pub const CMD_READ_ALL: &str = "READ ALL";

/// Write a sample to the present card.
///
/// Followed by the sample kind tag, the trait tokens in their fixed per-kind
/// order, and for RAW samples a trailing depletion marker.
pub const CMD_WRITE_SAMPLE: &str = "WRITESAMPLE";

// ============================================================================
// Incoming Line Prefixes
// ============================================================================

/// Prefix of the line announcing a card entered the reader's field.
///
/// The remainder is the card id followed by the trait tokens stored on it.
pub const PREFIX_TAG_FOUND: &str = "Tag found: ";

/// Prefix of the line announcing the card left the reader's field.
pub const PREFIX_TAG_LOST: &str = "Tag lost: ";

/// Prefix of the answer to [`CMD_READ_ALL`].
pub const PREFIX_TRAITS: &str = "Traits: ";

/// Prefix of the identity line.
///
/// Note: no trailing space. The firmware prints `Name:<value>`.
pub const PREFIX_NAME: &str = "Name:";

/// The exact acknowledgment line for a completed write.
pub const LINE_WRITE_COMPLETE: &str = "Write complete!";

// ============================================================================
// Trait Token Vocabulary
// ============================================================================

/// Sentinel the firmware uses for a tag that carries no sample data.
///
/// A trait list starting with this token is not an error on the wire, but it
/// never validates: the driver re-reads instead of surfacing it.
pub const TRAIT_SENTINEL_EMPTY: &str = "EMPTY";

/// Trait tokens a RAW sample carries (positive/negative action and target).
///
/// The on-wire depletion marker is not counted here; it travels as a separate
/// trailing token.
pub const RAW_TRAIT_COUNT: usize = 4;

/// Trait tokens a REFINED sample carries (primary/secondary pairs plus
/// purity).
pub const REFINED_TRAIT_COUNT: usize = 5;

/// Trait tokens a BLOOD sample carries (action, target, strength).
pub const BLOOD_TRAIT_COUNT: usize = 3;

// ============================================================================
// Transport Configuration
// ============================================================================

/// Baud rate the reader firmware ships with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Bound on a single blocking line read, in milliseconds.
///
/// A timeout with no data is a normal idle poll, not a failure; the listen
/// loop simply polls again.
pub const READ_TIMEOUT_MS: u64 = 3_000;

/// Delay between opening the port and starting the send/listen loops, in
/// milliseconds.
///
/// Opening the serial port resets the reader's microcontroller; it needs a
/// moment to boot before it will answer anything.
pub const STARTUP_GRACE_MS: u64 = 2_000;

// ============================================================================
// Driver Timing
// ============================================================================

/// Interval of the session send loop's housekeeping tick, in milliseconds.
///
/// Each tick sends an identity query while the reader is still anonymous and
/// drains a pending trait re-read request.
pub const SEND_TICK_INTERVAL_MS: u64 = 500;

/// Fixed delay before retrying a failed or lost connection, in milliseconds.
///
/// There is deliberately no exponential backoff and no retry cap: a handful
/// of locally attached readers either come back or stay absent, and either
/// way a retry every few seconds costs nothing.
pub const RECONNECT_BACKOFF_MS: u64 = 5_000;

/// Interval between controller scans for newly attached ports, in
/// milliseconds.
pub const SCAN_INTERVAL_MS: u64 = 5_000;

// ============================================================================
// Limits
// ============================================================================

/// Maximum accepted length of one incoming line, in bytes.
///
/// The longest legitimate line is a `Tag found:` announcement for a REFINED
/// sample, well under 200 bytes. A line that exceeds this without a newline
/// means the stream is broken, not that a tag is chatty.
///
/// # Examples
///
/// ```
/// use lodestone_core::constants::MAX_LINE_BYTES;
///
/// let line = "Tag found: X1 REFINED CREATING KRYSTAL DESTROYING ENERGY LUCID";
/// assert!(line.len() < MAX_LINE_BYTES);
/// ```
pub const MAX_LINE_BYTES: usize = 512;

/// Capacity of a session's outgoing command channel.
///
/// Callers issue at most a couple of commands per human interaction; a full
/// channel signals a stuck send loop and the enqueue fails rather than
/// blocking.
pub const COMMAND_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// Discovery Defaults
// ============================================================================

/// Directory scanned for candidate reader ports.
pub const DEFAULT_DISCOVERY_ROOT: &str = "/dev";

/// Filename patterns of candidate reader ports under the discovery root.
///
/// Covers the usual USB-serial adapter and CDC-ACM naming schemes on Linux.
pub const DEFAULT_PORT_PATTERNS: &[&str] = &["ttyUSB*", "ttyACM*"];
