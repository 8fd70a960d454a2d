//! Line protocol spoken by the krystallium sample readers.
//!
//! The readers exchange newline-terminated ASCII lines over a serial link.
//! This crate is the pure part of that exchange: it knows how to render the
//! closed set of outgoing [`Command`]s, how to classify incoming lines into
//! typed [`Event`]s, and how to sanity-check the trait tokens a reader echoes.
//! It performs no I/O and holds no connection state.
//!
//! # Architecture
//!
//! ```text
//! serial bytes -> LineCodec (Decoder) -> Event  (typed, one per line)
//! Command -> LineCodec (Encoder) -> serial bytes (framing newline + line)
//! ```
//!
//! - [`Command`]: the four things a client can say (`NAME`, `NAME <value>`,
//!   `READ ALL`, `WRITESAMPLE ...`)
//! - [`Event`]: the five things a reader can answer, plus `Unrecognized` for
//!   everything else
//! - [`validate_trait_args`]: advisory check that an echoed trait list looks
//!   like an intact read
//! - [`LineCodec`]: `tokio_util::codec` integration for use with
//!   `FramedRead`/`FramedWrite`

pub mod codec;
pub mod command;
pub mod event;
pub mod validation;

pub use codec::LineCodec;
pub use command::Command;
pub use event::Event;
pub use validation::validate_trait_args;
