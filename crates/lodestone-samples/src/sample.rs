//! The three sample shapes a tag can hold.
//!
//! Each shape knows its wire form: the trait tokens it contributes to a
//! `WRITESAMPLE` command and how to rebuild itself from the upper-cased
//! token list a reader echoes back. The wire carries attributes only;
//! origin and rarity are bookkeeping that never leaves the client, so
//! samples parsed off a tag come back with an empty origin and zero rarity.

use serde::{Deserialize, Serialize};
use std::fmt;

use lodestone_core::constants::{BLOOD_TRAIT_COUNT, RAW_TRAIT_COUNT, REFINED_TRAIT_COUNT};
use lodestone_core::{Depletion, SampleKind};

use crate::attribute::{Action, Purity, Strength, Target, Vulgarity};
use crate::error::{Result, SampleError};

/// Wire tokens a RAW tag carries after its kind tag: four attributes plus
/// the depletion marker.
const RAW_WIRE_TOKENS: usize = RAW_TRAIT_COUNT + 1;

/// An unrefined sample straight from a mining site.
///
/// The vulgarity grade is derived from the two action/target pairs, never
/// stored on the tag; [`RawSample::new`] derives it so the struct cannot
/// drift out of sync with its own pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub positive_action: Action,
    pub positive_target: Target,
    pub negative_action: Action,
    pub negative_target: Target,
    pub vulgarity: Vulgarity,
    pub origin: String,
    pub rarity: f64,
    pub depleted: bool,
}

impl RawSample {
    /// Create a raw sample, deriving its vulgarity from the pairs.
    #[must_use]
    pub fn new(
        positive_action: Action,
        positive_target: Target,
        negative_action: Action,
        negative_target: Target,
        origin: impl Into<String>,
        rarity: f64,
        depleted: bool,
    ) -> Self {
        RawSample {
            positive_action,
            positive_target,
            negative_action,
            negative_target,
            vulgarity: Vulgarity::from_raw(
                positive_action,
                positive_target,
                negative_action,
                negative_target,
            ),
            origin: origin.into(),
            rarity,
            depleted,
        }
    }

    /// Parse the five tokens a reader echoes after the `RAW` kind tag:
    /// four attributes followed by the depletion marker.
    ///
    /// # Errors
    /// Returns `SampleError::WrongTokenCount` on a malformed list and an
    /// attribute parse error for any unknown token.
    pub fn from_wire<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.len() != RAW_WIRE_TOKENS {
            return Err(SampleError::WrongTokenCount {
                kind: SampleKind::Raw,
                expected: RAW_WIRE_TOKENS,
                actual: tokens.len(),
            });
        }
        let positive_action: Action = tokens[0].as_ref().parse()?;
        let positive_target: Target = tokens[1].as_ref().parse()?;
        let negative_action: Action = tokens[2].as_ref().parse()?;
        let negative_target: Target = tokens[3].as_ref().parse()?;
        let depletion: Depletion = tokens[4].as_ref().parse()?;
        Ok(RawSample::new(
            positive_action,
            positive_target,
            negative_action,
            negative_target,
            String::new(),
            0.0,
            depletion == Depletion::Depleted,
        ))
    }

    /// The four trait tokens for a `WRITESAMPLE RAW` command.
    ///
    /// The depletion marker is appended separately; see
    /// [`RawSample::depletion`].
    #[must_use]
    pub fn wire_traits(&self) -> Vec<String> {
        vec![
            self.positive_action.as_str().to_string(),
            self.positive_target.as_str().to_string(),
            self.negative_action.as_str().to_string(),
            self.negative_target.as_str().to_string(),
        ]
    }

    /// The depletion marker this sample writes after its traits.
    #[must_use]
    pub fn depletion(&self) -> Depletion {
        if self.depleted {
            Depletion::Depleted
        } else {
            Depletion::Active
        }
    }
}

impl fmt::Display for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Positive Action: {}", self.positive_action)?;
        writeln!(f, "Positive Target: {}", self.positive_target)?;
        writeln!(f, "Negative Action: {}", self.negative_action)?;
        writeln!(f, "Negative Target: {}", self.negative_target)?;
        writeln!(f, "Vulgarity: {} ({})", self.vulgarity, self.vulgarity.value())?;
        writeln!(f, "Origin: {}", self.origin)?;
        writeln!(f, "Rarity: {:.1}", self.rarity)?;
        write!(f, "Depleted: {}", self.depleted)
    }
}

/// The product of refining two raw samples together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedSample {
    pub primary_action: Action,
    pub primary_target: Target,
    pub secondary_action: Action,
    pub secondary_target: Target,
    pub purity: Purity,
    pub origin: String,
    pub rarity: f64,
}

impl RefinedSample {
    /// Create a refined sample with an explicit purity grade.
    #[must_use]
    pub fn new(
        primary_action: Action,
        primary_target: Target,
        secondary_action: Action,
        secondary_target: Target,
        purity: Purity,
        origin: impl Into<String>,
        rarity: f64,
    ) -> Self {
        RefinedSample {
            primary_action,
            primary_target,
            secondary_action,
            secondary_target,
            purity,
            origin: origin.into(),
            rarity,
        }
    }

    /// Refine two raw samples into one.
    ///
    /// The actions come from the second raw, the targets from the first.
    /// Purity is the combined vulgarity of both inputs, the origins are
    /// joined with a space and the rarity is averaged.
    #[must_use]
    pub fn combine(first: &RawSample, second: &RawSample) -> Self {
        RefinedSample {
            primary_action: second.positive_action,
            primary_target: first.positive_target,
            secondary_action: second.negative_action,
            secondary_target: first.negative_target,
            purity: Purity::from_combined(first.vulgarity, second.vulgarity),
            origin: format!("{} {}", first.origin, second.origin),
            rarity: (first.rarity + second.rarity) / 2.0,
        }
    }

    /// Parse the five tokens a reader echoes after the `REFINED` kind tag:
    /// four attributes followed by the purity grade.
    ///
    /// # Errors
    /// Returns `SampleError::WrongTokenCount` on a malformed list and an
    /// attribute parse error for any unknown token.
    pub fn from_wire<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.len() != REFINED_TRAIT_COUNT {
            return Err(SampleError::WrongTokenCount {
                kind: SampleKind::Refined,
                expected: REFINED_TRAIT_COUNT,
                actual: tokens.len(),
            });
        }
        Ok(RefinedSample {
            primary_action: tokens[0].as_ref().parse()?,
            primary_target: tokens[1].as_ref().parse()?,
            secondary_action: tokens[2].as_ref().parse()?,
            secondary_target: tokens[3].as_ref().parse()?,
            purity: tokens[4].as_ref().parse()?,
            origin: String::new(),
            rarity: 0.0,
        })
    }

    /// The five trait tokens for a `WRITESAMPLE REFINED` command.
    #[must_use]
    pub fn wire_traits(&self) -> Vec<String> {
        vec![
            self.primary_action.as_str().to_string(),
            self.primary_target.as_str().to_string(),
            self.secondary_action.as_str().to_string(),
            self.secondary_target.as_str().to_string(),
            self.purity.as_str().to_string(),
        ]
    }
}

impl fmt::Display for RefinedSample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Primary Action: {}", self.primary_action)?;
        writeln!(f, "Primary Target: {}", self.primary_target)?;
        writeln!(f, "Secondary Action: {}", self.secondary_action)?;
        writeln!(f, "Secondary Target: {}", self.secondary_target)?;
        writeln!(f, "Purity: {} ({})", self.purity, self.purity.value())?;
        writeln!(f, "Origin: {}", self.origin)?;
        write!(f, "Rarity: {:.1}", self.rarity)
    }
}

/// A blood sample drawn at a site, graded by strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodSample {
    pub action: Action,
    pub target: Target,
    pub strength: Strength,
    pub origin: String,
}

impl BloodSample {
    /// Create a blood sample.
    #[must_use]
    pub fn new(
        action: Action,
        target: Target,
        strength: Strength,
        origin: impl Into<String>,
    ) -> Self {
        BloodSample {
            action,
            target,
            strength,
            origin: origin.into(),
        }
    }

    /// Parse the three tokens a reader echoes after the `BLOOD` kind tag.
    ///
    /// # Errors
    /// Returns `SampleError::WrongTokenCount` on a malformed list and an
    /// attribute parse error for any unknown token.
    pub fn from_wire<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.len() != BLOOD_TRAIT_COUNT {
            return Err(SampleError::WrongTokenCount {
                kind: SampleKind::Blood,
                expected: BLOOD_TRAIT_COUNT,
                actual: tokens.len(),
            });
        }
        Ok(BloodSample {
            action: tokens[0].as_ref().parse()?,
            target: tokens[1].as_ref().parse()?,
            strength: tokens[2].as_ref().parse()?,
            origin: String::new(),
        })
    }

    /// The three trait tokens for a `WRITESAMPLE BLOOD` command.
    #[must_use]
    pub fn wire_traits(&self) -> Vec<String> {
        vec![
            self.action.as_str().to_string(),
            self.target.as_str().to_string(),
            self.strength.as_str().to_string(),
        ]
    }
}

impl fmt::Display for BloodSample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Action: {}", self.action)?;
        writeln!(f, "Target: {}", self.target)?;
        writeln!(f, "Strength: {} ({})", self.strength, self.strength.value())?;
        write!(f, "Origin: {}", self.origin)
    }
}

/// Any sample, tagged by kind.
///
/// This is the shape consumers get when they hand a reader's echoed token
/// list (kind tag first) to [`Sample::from_args`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    Raw(RawSample),
    Refined(RefinedSample),
    Blood(BloodSample),
}

impl Sample {
    /// The kind tag this sample writes and reads under.
    #[must_use]
    pub fn kind(&self) -> SampleKind {
        match self {
            Sample::Raw(_) => SampleKind::Raw,
            Sample::Refined(_) => SampleKind::Refined,
            Sample::Blood(_) => SampleKind::Blood,
        }
    }

    /// Parse a full echoed token list, kind tag first.
    ///
    /// This accepts exactly what a validated `Tag found:` or `Traits:`
    /// line carries, e.g. `["RAW", "CREATING", "KRYSTAL", "DESTROYING",
    /// "ENERGY", "ACTIVE"]`.
    ///
    /// # Errors
    /// Returns an unknown-kind error when the first token is not a kind
    /// tag, and the per-kind parse errors otherwise.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let kind_token = args.first().map_or("", AsRef::as_ref);
        let kind: SampleKind = kind_token.parse()?;
        let tokens = &args[1..];
        match kind {
            SampleKind::Raw => Ok(Sample::Raw(RawSample::from_wire(tokens)?)),
            SampleKind::Refined => Ok(Sample::Refined(RefinedSample::from_wire(tokens)?)),
            SampleKind::Blood => Ok(Sample::Blood(BloodSample::from_wire(tokens)?)),
        }
    }

    /// The trait tokens for a `WRITESAMPLE` command, without the kind tag
    /// or depletion marker.
    #[must_use]
    pub fn wire_traits(&self) -> Vec<String> {
        match self {
            Sample::Raw(raw) => raw.wire_traits(),
            Sample::Refined(refined) => refined.wire_traits(),
            Sample::Blood(blood) => blood.wire_traits(),
        }
    }

    /// The depletion marker to write, `Some` only for RAW samples.
    #[must_use]
    pub fn depletion(&self) -> Option<Depletion> {
        match self {
            Sample::Raw(raw) => Some(raw.depletion()),
            Sample::Refined(_) | Sample::Blood(_) => None,
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sample::Raw(raw) => raw.fmt(f),
            Sample::Refined(refined) => refined.fmt(f),
            Sample::Blood(blood) => blood.fmt(f),
        }
    }
}
