//! Incoming line classification.
//!
//! Each line a reader prints is classified by literal prefix match into one
//! of five event shapes; anything else becomes [`Event::Unrecognized`] and is
//! surfaced for diagnostics only. Classification is total: every line maps to
//! exactly one variant.

use lodestone_core::{
    CardId,
    constants::{LINE_WRITE_COMPLETE, PREFIX_NAME, PREFIX_TAG_FOUND, PREFIX_TAG_LOST, PREFIX_TRAITS},
};

/// One decoded line from a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `Tag found: <card> <token...>` — a card entered the field.
    ///
    /// `args` are the raw tokens after the card id (sample kind tag first),
    /// unvalidated; see
    /// [`validate_trait_args`](crate::validation::validate_trait_args).
    TagFound { card: CardId, args: Vec<String> },

    /// `Tag lost: <card>` — the card left the field.
    TagLost { card: CardId },

    /// `Traits: <token...>` — answer to a `READ ALL` request.
    Traits { args: Vec<String> },

    /// `Name:<value>` — the reader announced its configured name.
    ///
    /// The value is trimmed but otherwise uninterpreted; it may be empty on
    /// a factory-fresh reader.
    Name { value: String },

    /// `Write complete!` — the pending `WRITESAMPLE` finished.
    WriteComplete,

    /// Anything else, kept verbatim for diagnostics.
    Unrecognized { line: String },
}

impl Event {
    /// Classify one trimmed line.
    ///
    /// A `Tag found:`/`Tag lost:` line whose card token is missing or
    /// malformed does not make a half-usable event; it falls through to
    /// `Unrecognized`.
    #[must_use]
    pub fn parse(line: &str) -> Event {
        let line = line.trim();

        if line == LINE_WRITE_COMPLETE {
            return Event::WriteComplete;
        }

        if let Some(rest) = line.strip_prefix(PREFIX_TAG_FOUND) {
            let mut tokens = rest.split_whitespace();
            if let Some(Ok(card)) = tokens.next().map(CardId::new) {
                return Event::TagFound {
                    card,
                    args: tokens.map(str::to_string).collect(),
                };
            }
            return Event::unrecognized(line);
        }

        if let Some(rest) = line.strip_prefix(PREFIX_TAG_LOST) {
            if let Ok(card) = CardId::new(rest.trim()) {
                return Event::TagLost { card };
            }
            return Event::unrecognized(line);
        }

        if let Some(rest) = line.strip_prefix(PREFIX_TRAITS) {
            return Event::Traits {
                args: rest.split_whitespace().map(str::to_string).collect(),
            };
        }

        if let Some(rest) = line.strip_prefix(PREFIX_NAME) {
            return Event::Name {
                value: rest.trim().to_string(),
            };
        }

        Event::unrecognized(line)
    }

    fn unrecognized(line: &str) -> Event {
        Event::Unrecognized {
            line: line.to_string(),
        }
    }
}
