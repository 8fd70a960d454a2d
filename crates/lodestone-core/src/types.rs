use crate::{
    Result,
    constants::{BLOOD_TRAIT_COUNT, RAW_TRAIT_COUNT, REFINED_TRAIT_COUNT},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filesystem path of a serial transport endpoint (e.g. `/dev/ttyUSB0`).
///
/// Paths are the registry key for sessions but are not stable across
/// replugs; stable lookups go through [`DeviceName`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DevicePath(String);

impl DevicePath {
    /// Create a new device path with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDevicePath` if the path is empty.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(Error::invalid_device_path("path is empty"));
        }
        Ok(DevicePath(path))
    }

    /// Get the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DevicePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DevicePath::new(s)
    }
}

/// The logical name a reader announces for itself.
///
/// Learned from the device's `Name:` line, never assigned locally. This is
/// the stable key consumers use to address a reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceName(String);

impl DeviceName {
    /// Create a new device name with validation.
    ///
    /// The name is trimmed before validation. Interior spaces are allowed
    /// (the wire carries the name as the rest of the line), line breaks are
    /// not.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceName` if the trimmed name is empty or
    /// contains a line break.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_device_name("name is empty"));
        }
        if name.contains(['\n', '\r']) {
            return Err(Error::invalid_device_name("name contains a line break"));
        }
        Ok(DeviceName(name.to_string()))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceName::new(s)
    }
}

/// Identifier of one physical tag, as announced by the reader.
///
/// Opaque to the driver; it is the first token after the `Tag found:` /
/// `Tag lost:` prefixes and therefore cannot contain whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(String);

impl CardId {
    /// Create a new card id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` if the id is empty or contains
    /// whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_card_id("card id is empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::invalid_card_id(format!(
                "card id contains whitespace: {id:?}"
            )));
        }
        Ok(CardId(id))
    }

    /// Get the card id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardId::new(s)
    }
}

/// The three kinds of sample a tag can hold.
///
/// The wire tags (`RAW`, `REFINED`, `BLOOD`) lead every trait list, both in
/// `WRITESAMPLE` commands and in the token lists the reader echoes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    Raw,
    Refined,
    Blood,
}

impl SampleKind {
    /// The wire tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Raw => "RAW",
            SampleKind::Refined => "REFINED",
            SampleKind::Blood => "BLOOD",
        }
    }

    /// Number of trait tokens a sample of this kind carries.
    ///
    /// The RAW depletion marker is not a trait and is not counted.
    #[must_use]
    pub fn trait_count(&self) -> usize {
        match self {
            SampleKind::Raw => RAW_TRAIT_COUNT,
            SampleKind::Refined => REFINED_TRAIT_COUNT,
            SampleKind::Blood => BLOOD_TRAIT_COUNT,
        }
    }

    /// Check that a trait list has exactly the count this kind requires.
    ///
    /// # Errors
    /// Returns `Error::WrongTraitCount` on a mismatch.
    pub fn validate_traits(&self, traits: &[String]) -> Result<()> {
        let expected = self.trait_count();
        if traits.len() != expected {
            return Err(Error::WrongTraitCount {
                kind: *self,
                expected,
                actual: traits.len(),
            });
        }
        Ok(())
    }

    /// Check the depletion-marker pairing for this kind.
    ///
    /// RAW samples require a marker; the other kinds must not carry one.
    ///
    /// # Errors
    /// Returns `Error::MissingDepletionMarker` or
    /// `Error::UnexpectedDepletionMarker` on a mismatch.
    pub fn validate_depletion(&self, depletion: Option<Depletion>) -> Result<()> {
        match (self, depletion) {
            (SampleKind::Raw, None) => Err(Error::MissingDepletionMarker { kind: *self }),
            (SampleKind::Raw, Some(_)) => Ok(()),
            (_, None) => Ok(()),
            (_, Some(_)) => Err(Error::UnexpectedDepletionMarker { kind: *self }),
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SampleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RAW" => Ok(SampleKind::Raw),
            "REFINED" => Ok(SampleKind::Refined),
            "BLOOD" => Ok(SampleKind::Blood),
            _ => Err(Error::UnknownSampleKind {
                value: s.to_string(),
            }),
        }
    }
}

/// The depletion marker a RAW sample carries after its trait tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depletion {
    Active,
    Depleted,
}

impl Depletion {
    /// The wire token for this marker, as written by the client.
    ///
    /// The reader echoes it back upper-cased like every other token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Depletion::Active => "active",
            Depletion::Depleted => "depleted",
        }
    }
}

impl fmt::Display for Depletion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Depletion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Depletion::Active),
            "depleted" => Ok(Depletion::Depleted),
            _ => Err(Error::UnknownDepletionMarker {
                value: s.to_string(),
            }),
        }
    }
}

/// Connection state of one device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    /// No transport; the supervisor will retry after its backoff.
    Disconnected,
    /// Port opened, waiting out the startup grace before the loops run.
    Connecting,
    /// Send/listen loops running.
    Connected,
}

impl LinkState {
    /// Whether the session currently accepts commands.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn device_path_rejects_empty() {
        assert!(matches!(
            DevicePath::new(""),
            Err(Error::InvalidDevicePath { .. })
        ));
        assert!(matches!(
            DevicePath::new("   "),
            Err(Error::InvalidDevicePath { .. })
        ));
    }

    #[test]
    fn device_path_round_trips() {
        let path = DevicePath::new("/dev/ttyUSB0").unwrap();
        assert_eq!(path.as_str(), "/dev/ttyUSB0");
        assert_eq!(path.to_string(), "/dev/ttyUSB0");
    }

    #[rstest]
    #[case("Gate-1", "Gate-1")]
    #[case("  Gate-1  ", "Gate-1")]
    #[case("North Door", "North Door")]
    fn device_name_trims(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(DeviceName::new(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("Gate\n1")]
    fn device_name_rejects(#[case] input: &str) {
        assert!(matches!(
            DeviceName::new(input),
            Err(Error::InvalidDeviceName { .. })
        ));
    }

    #[test]
    fn card_id_rejects_whitespace() {
        assert!(matches!(
            CardId::new("X 1"),
            Err(Error::InvalidCardId { .. })
        ));
        assert!(matches!(CardId::new(""), Err(Error::InvalidCardId { .. })));
        assert_eq!(CardId::new("X1").unwrap().as_str(), "X1");
    }

    #[rstest]
    #[case("RAW", SampleKind::Raw)]
    #[case("raw", SampleKind::Raw)]
    #[case("Refined", SampleKind::Refined)]
    #[case("BLOOD", SampleKind::Blood)]
    fn sample_kind_parses_case_insensitively(#[case] input: &str, #[case] expected: SampleKind) {
        assert_eq!(input.parse::<SampleKind>().unwrap(), expected);
    }

    #[test]
    fn sample_kind_rejects_unknown() {
        assert!(matches!(
            "CRUDE".parse::<SampleKind>(),
            Err(Error::UnknownSampleKind { .. })
        ));
    }

    #[rstest]
    #[case(SampleKind::Raw, 4)]
    #[case(SampleKind::Refined, 5)]
    #[case(SampleKind::Blood, 3)]
    fn trait_counts(#[case] kind: SampleKind, #[case] expected: usize) {
        assert_eq!(kind.trait_count(), expected);
    }

    #[test]
    fn validate_traits_reports_counts() {
        let err = SampleKind::Blood.validate_traits(&toks("Increasing Krystal")).unwrap_err();
        assert!(matches!(
            err,
            Error::WrongTraitCount {
                kind: SampleKind::Blood,
                expected: 3,
                actual: 2,
            }
        ));
        assert!(SampleKind::Blood.validate_traits(&toks("Increasing Krystal Weak")).is_ok());
    }

    #[test]
    fn depletion_pairing() {
        assert!(matches!(
            SampleKind::Raw.validate_depletion(None),
            Err(Error::MissingDepletionMarker { .. })
        ));
        assert!(SampleKind::Raw.validate_depletion(Some(Depletion::Active)).is_ok());
        assert!(matches!(
            SampleKind::Blood.validate_depletion(Some(Depletion::Depleted)),
            Err(Error::UnexpectedDepletionMarker { .. })
        ));
        assert!(SampleKind::Refined.validate_depletion(None).is_ok());
    }

    #[rstest]
    #[case("DEPLETED", Depletion::Depleted)]
    #[case("active", Depletion::Active)]
    fn depletion_parses_case_insensitively(#[case] input: &str, #[case] expected: Depletion) {
        assert_eq!(input.parse::<Depletion>().unwrap(), expected);
    }

    #[test]
    fn link_state_helpers() {
        assert!(LinkState::Connected.is_connected());
        assert!(!LinkState::Connecting.is_connected());
        assert_eq!(LinkState::Disconnected.to_string(), "disconnected");
    }
}
