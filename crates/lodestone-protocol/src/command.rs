//! Outgoing commands and their wire rendering.
//!
//! The command set is closed: the readers understand exactly four requests.
//! Rendering joins the keyword and its space-separated arguments; the leading
//! framing newline is added by the [`LineCodec`](crate::codec::LineCodec)
//! encoder, not here.

use std::fmt;

use lodestone_core::{
    Depletion, DeviceName, SampleKind,
    constants::{CMD_NAME, CMD_READ_ALL, CMD_WRITE_SAMPLE},
};

/// One request to a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `NAME` — ask the reader for its configured name.
    QueryName,

    /// `NAME <value>` — store a new name on the reader.
    ///
    /// The reader's own `Name:` echo stays the single source of truth for
    /// session identity; sending this does not rename the session.
    SetName { name: DeviceName },

    /// `READ ALL` — ask for a full re-read of the present card's traits.
    ReadAll,

    /// `WRITESAMPLE <KIND> <trait...>[ <marker>]` — write a sample to the
    /// present card.
    ///
    /// `traits` are carried verbatim; the depletion marker is appended after
    /// them for RAW samples. Count and marker rules are enforced by the
    /// session before a command of this shape is built.
    WriteSample {
        kind: SampleKind,
        traits: Vec<String>,
        depletion: Option<Depletion>,
    },
}

impl Command {
    /// Render the command as one wire line, without terminators.
    #[must_use]
    pub fn as_line(&self) -> String {
        match self {
            Command::QueryName => CMD_NAME.to_string(),
            Command::SetName { name } => format!("{CMD_NAME} {name}"),
            Command::ReadAll => CMD_READ_ALL.to_string(),
            Command::WriteSample {
                kind,
                traits,
                depletion,
            } => {
                let mut line = format!("{CMD_WRITE_SAMPLE} {kind}");
                for trait_token in traits {
                    line.push(' ');
                    line.push_str(trait_token);
                }
                if let Some(marker) = depletion {
                    line.push(' ');
                    line.push_str(marker.as_str());
                }
                line
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn query_name_line() {
        assert_eq!(Command::QueryName.as_line(), "NAME");
    }

    #[test]
    fn set_name_line() {
        let cmd = Command::SetName {
            name: DeviceName::new("Gate-1").unwrap(),
        };
        assert_eq!(cmd.as_line(), "NAME Gate-1");
    }

    #[test]
    fn read_all_line() {
        assert_eq!(Command::ReadAll.as_line(), "READ ALL");
    }

    #[test]
    fn write_raw_sample_appends_marker() {
        let cmd = Command::WriteSample {
            kind: SampleKind::Raw,
            traits: toks("Creating Krystal Destroying Energy"),
            depletion: Some(Depletion::Depleted),
        };
        assert_eq!(
            cmd.as_line(),
            "WRITESAMPLE RAW Creating Krystal Destroying Energy depleted"
        );
    }

    #[test]
    fn write_blood_sample_has_no_marker() {
        let cmd = Command::WriteSample {
            kind: SampleKind::Blood,
            traits: toks("Increasing Krystal Weak"),
            depletion: None,
        };
        assert_eq!(cmd.as_line(), "WRITESAMPLE BLOOD Increasing Krystal Weak");
    }

    #[test]
    fn display_matches_line() {
        let cmd = Command::SetName {
            name: DeviceName::new("North Door").unwrap(),
        };
        assert_eq!(cmd.to_string(), cmd.as_line());
    }
}
