//! The attribute vocabulary samples are made of.
//!
//! Attribute tokens travel over the wire in whatever case the writer used
//! and come back upper-cased from the reader, so every `FromStr` here is
//! case-insensitive; `as_str` returns the canonical spelling used when
//! writing tags and printing reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SampleError;

/// What a sample does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Creating,
    Destroying,
    Increasing,
    Decreasing,
    Expanding,
    Contracting,
    Conducting,
    Insulating,
    Fortifying,
    Deteriorating,
    Absorbing,
    Releasing,
    Heating,
    Cooling,
    Lightening,
    Encumbering,
    Solidifying,
}

impl Action {
    /// Canonical token for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Creating => "Creating",
            Action::Destroying => "Destroying",
            Action::Increasing => "Increasing",
            Action::Decreasing => "Decreasing",
            Action::Expanding => "Expanding",
            Action::Contracting => "Contracting",
            Action::Conducting => "Conducting",
            Action::Insulating => "Insulating",
            Action::Fortifying => "Fortifying",
            Action::Deteriorating => "Deteriorating",
            Action::Absorbing => "Absorbing",
            Action::Releasing => "Releasing",
            Action::Heating => "Heating",
            Action::Cooling => "Cooling",
            Action::Lightening => "Lightening",
            Action::Encumbering => "Encumbering",
            Action::Solidifying => "Solidifying",
        }
    }

    /// Whether two actions cancel each other out.
    ///
    /// Symmetric. `Solidifying` has no opposite.
    #[must_use]
    pub fn is_opposing(first: Action, second: Action) -> bool {
        const OPPOSING: &[(Action, Action)] = &[
            (Action::Creating, Action::Destroying),
            (Action::Increasing, Action::Decreasing),
            (Action::Expanding, Action::Contracting),
            (Action::Conducting, Action::Insulating),
            (Action::Fortifying, Action::Deteriorating),
            (Action::Absorbing, Action::Releasing),
            (Action::Heating, Action::Cooling),
            (Action::Lightening, Action::Encumbering),
        ];
        OPPOSING
            .iter()
            .any(|&(a, b)| (a, b) == (first, second) || (b, a) == (first, second))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "creating" => Ok(Action::Creating),
            "destroying" => Ok(Action::Destroying),
            "increasing" => Ok(Action::Increasing),
            "decreasing" => Ok(Action::Decreasing),
            "expanding" => Ok(Action::Expanding),
            "contracting" => Ok(Action::Contracting),
            "conducting" => Ok(Action::Conducting),
            "insulating" => Ok(Action::Insulating),
            "fortifying" => Ok(Action::Fortifying),
            "deteriorating" => Ok(Action::Deteriorating),
            "absorbing" => Ok(Action::Absorbing),
            "releasing" => Ok(Action::Releasing),
            "heating" => Ok(Action::Heating),
            "cooling" => Ok(Action::Cooling),
            "lightening" => Ok(Action::Lightening),
            "encumbering" => Ok(Action::Encumbering),
            "solidifying" => Ok(Action::Solidifying),
            _ => Err(SampleError::unknown_attribute("action", s)),
        }
    }
}

/// What a sample acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Solid,
    Liquid,
    Gas,
    Krystal,
    Plant,
    Energy,
    Light,
    Sound,
    Flesh,
    Mind,
}

impl Target {
    /// Canonical token for this target.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Solid => "Solid",
            Target::Liquid => "Liquid",
            Target::Gas => "Gas",
            Target::Krystal => "Krystal",
            Target::Plant => "Plant",
            Target::Energy => "Energy",
            Target::Light => "Light",
            Target::Sound => "Sound",
            Target::Flesh => "Flesh",
            Target::Mind => "Mind",
        }
    }

    /// Whether two targets cancel each other out. Symmetric.
    #[must_use]
    pub fn is_opposing(first: Target, second: Target) -> bool {
        const OPPOSING: &[(Target, Target)] = &[
            (Target::Mind, Target::Flesh),
            (Target::Flesh, Target::Plant),
            (Target::Gas, Target::Solid),
            (Target::Gas, Target::Liquid),
            (Target::Krystal, Target::Energy),
        ];
        OPPOSING
            .iter()
            .any(|&(a, b)| (a, b) == (first, second) || (b, a) == (first, second))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Target {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "solid" => Ok(Target::Solid),
            "liquid" => Ok(Target::Liquid),
            "gas" => Ok(Target::Gas),
            "krystal" => Ok(Target::Krystal),
            "plant" => Ok(Target::Plant),
            "energy" => Ok(Target::Energy),
            "light" => Ok(Target::Light),
            "sound" => Ok(Target::Sound),
            "flesh" => Ok(Target::Flesh),
            "mind" => Ok(Target::Mind),
            _ => Err(SampleError::unknown_attribute("target", s)),
        }
    }
}

/// Worth class of a raw sample, derived from its two action/target pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Vulgarity {
    Vulgar = 1,
    LowMundane = 2,
    HighMundane = 3,
    LowSemiPrecious = 4,
    HighSemiPrecious = 5,
    Precious = 6,
}

impl Vulgarity {
    /// Canonical token for this vulgarity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Vulgarity::Vulgar => "Vulgar",
            Vulgarity::LowMundane => "LowMundane",
            Vulgarity::HighMundane => "HighMundane",
            Vulgarity::LowSemiPrecious => "LowSemiPrecious",
            Vulgarity::HighSemiPrecious => "HighSemiPrecious",
            Vulgarity::Precious => "Precious",
        }
    }

    /// Numeric grade, 1 (Vulgar) through 6 (Precious).
    #[must_use]
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Derive the vulgarity of a raw sample from its pairs.
    ///
    /// Matching pairs grade high, opposing pairs grade the middle, unrelated
    /// pairs grade low:
    /// - both pairs identical → Precious
    /// - one pair identical → HighSemiPrecious if the other pair opposes,
    ///   else LowSemiPrecious
    /// - both pairs opposing → HighMundane
    /// - one pair opposing → LowMundane
    /// - otherwise → Vulgar
    #[must_use]
    pub fn from_raw(
        positive_action: Action,
        positive_target: Target,
        negative_action: Action,
        negative_target: Target,
    ) -> Vulgarity {
        let action_invariant = positive_action == negative_action;
        let target_invariant = positive_target == negative_target;

        if action_invariant && target_invariant {
            return Vulgarity::Precious;
        }

        let action_opposing = Action::is_opposing(positive_action, negative_action);
        let target_opposing = Target::is_opposing(positive_target, negative_target);

        if action_invariant || target_invariant {
            let other_axis_opposing = if action_invariant {
                target_opposing
            } else {
                action_opposing
            };
            return if other_axis_opposing {
                Vulgarity::HighSemiPrecious
            } else {
                Vulgarity::LowSemiPrecious
            };
        }

        if action_opposing && target_opposing {
            return Vulgarity::HighMundane;
        }
        if action_opposing || target_opposing {
            return Vulgarity::LowMundane;
        }
        Vulgarity::Vulgar
    }
}

impl fmt::Display for Vulgarity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Vulgarity {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vulgar" => Ok(Vulgarity::Vulgar),
            "lowmundane" => Ok(Vulgarity::LowMundane),
            "highmundane" => Ok(Vulgarity::HighMundane),
            "lowsemiprecious" => Ok(Vulgarity::LowSemiPrecious),
            "highsemiprecious" => Ok(Vulgarity::HighSemiPrecious),
            "precious" => Ok(Vulgarity::Precious),
            _ => Err(SampleError::unknown_attribute("vulgarity", s)),
        }
    }
}

/// Worth class of a refined sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Purity {
    Polluted = 1,
    Tarnished = 2,
    Dirty = 3,
    Blemished = 4,
    Impure = 5,
    Unblemished = 6,
    Lucid = 7,
    Stainless = 8,
    Pristine = 9,
    Immaculate = 10,
    Perfect = 11,
}

impl Purity {
    /// Canonical token for this purity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Purity::Polluted => "Polluted",
            Purity::Tarnished => "Tarnished",
            Purity::Dirty => "Dirty",
            Purity::Blemished => "Blemished",
            Purity::Impure => "Impure",
            Purity::Unblemished => "Unblemished",
            Purity::Lucid => "Lucid",
            Purity::Stainless => "Stainless",
            Purity::Pristine => "Pristine",
            Purity::Immaculate => "Immaculate",
            Purity::Perfect => "Perfect",
        }
    }

    /// Numeric grade, 1 (Polluted) through 11 (Perfect).
    #[must_use]
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Purity of a refined sample: the sum of its two source vulgarities,
    /// saturating at Perfect (two Precious raws sum past the scale's end).
    #[must_use]
    pub fn from_combined(first: Vulgarity, second: Vulgarity) -> Purity {
        match (first as u8).saturating_add(second as u8) {
            0..=2 => Purity::Tarnished,
            3 => Purity::Dirty,
            4 => Purity::Blemished,
            5 => Purity::Impure,
            6 => Purity::Unblemished,
            7 => Purity::Lucid,
            8 => Purity::Stainless,
            9 => Purity::Pristine,
            10 => Purity::Immaculate,
            _ => Purity::Perfect,
        }
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Purity {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "polluted" => Ok(Purity::Polluted),
            "tarnished" => Ok(Purity::Tarnished),
            "dirty" => Ok(Purity::Dirty),
            "blemished" => Ok(Purity::Blemished),
            "impure" => Ok(Purity::Impure),
            "unblemished" => Ok(Purity::Unblemished),
            "lucid" => Ok(Purity::Lucid),
            "stainless" => Ok(Purity::Stainless),
            "pristine" => Ok(Purity::Pristine),
            "immaculate" => Ok(Purity::Immaculate),
            "perfect" => Ok(Purity::Perfect),
            _ => Err(SampleError::unknown_attribute("purity", s)),
        }
    }
}

/// Potency of a blood sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Strength {
    Nothing = 0,
    Weak = 1,
    Medium = 2,
    Strong = 3,
    Overbearing = 4,
}

impl Strength {
    /// Canonical token for this strength.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Nothing => "Nothing",
            Strength::Weak => "Weak",
            Strength::Medium => "Medium",
            Strength::Strong => "Strong",
            Strength::Overbearing => "Overbearing",
        }
    }

    /// Numeric grade, 0 (Nothing) through 4 (Overbearing).
    #[must_use]
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strength {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nothing" => Ok(Strength::Nothing),
            "weak" => Ok(Strength::Weak),
            "medium" => Ok(Strength::Medium),
            "strong" => Ok(Strength::Strong),
            "overbearing" => Ok(Strength::Overbearing),
            _ => Err(SampleError::unknown_attribute("strength", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn opposing_actions_are_symmetric() {
        assert!(Action::is_opposing(Action::Creating, Action::Destroying));
        assert!(Action::is_opposing(Action::Destroying, Action::Creating));
        assert!(!Action::is_opposing(Action::Creating, Action::Heating));
        assert!(!Action::is_opposing(Action::Solidifying, Action::Solidifying));
    }

    #[test]
    fn opposing_targets_are_symmetric() {
        assert!(Target::is_opposing(Target::Gas, Target::Liquid));
        assert!(Target::is_opposing(Target::Liquid, Target::Gas));
        assert!(Target::is_opposing(Target::Krystal, Target::Energy));
        assert!(!Target::is_opposing(Target::Mind, Target::Sound));
    }

    #[rstest]
    // Both pairs identical.
    #[case(Action::Heating, Target::Solid, Action::Heating, Target::Solid, Vulgarity::Precious)]
    // Action identical, targets opposing.
    #[case(Action::Heating, Target::Gas, Action::Heating, Target::Solid, Vulgarity::HighSemiPrecious)]
    // Action identical, targets merely different.
    #[case(Action::Heating, Target::Gas, Action::Heating, Target::Mind, Vulgarity::LowSemiPrecious)]
    // Target identical, actions opposing.
    #[case(Action::Heating, Target::Gas, Action::Cooling, Target::Gas, Vulgarity::HighSemiPrecious)]
    // Target identical, actions merely different.
    #[case(Action::Heating, Target::Gas, Action::Creating, Target::Gas, Vulgarity::LowSemiPrecious)]
    // Both axes opposing.
    #[case(Action::Heating, Target::Gas, Action::Cooling, Target::Solid, Vulgarity::HighMundane)]
    // One axis opposing.
    #[case(Action::Heating, Target::Gas, Action::Cooling, Target::Mind, Vulgarity::LowMundane)]
    // Nothing related.
    #[case(Action::Heating, Target::Gas, Action::Creating, Target::Mind, Vulgarity::Vulgar)]
    fn vulgarity_derivation(
        #[case] positive_action: Action,
        #[case] positive_target: Target,
        #[case] negative_action: Action,
        #[case] negative_target: Target,
        #[case] expected: Vulgarity,
    ) {
        assert_eq!(
            Vulgarity::from_raw(positive_action, positive_target, negative_action, negative_target),
            expected
        );
    }

    #[rstest]
    #[case(Vulgarity::Vulgar, Vulgarity::Vulgar, Purity::Tarnished)]
    #[case(Vulgarity::Vulgar, Vulgarity::LowMundane, Purity::Dirty)]
    #[case(Vulgarity::HighMundane, Vulgarity::LowSemiPrecious, Purity::Lucid)]
    #[case(Vulgarity::Precious, Vulgarity::HighSemiPrecious, Purity::Perfect)]
    // Past the top of the scale: saturates instead of failing.
    #[case(Vulgarity::Precious, Vulgarity::Precious, Purity::Perfect)]
    fn purity_combination(
        #[case] first: Vulgarity,
        #[case] second: Vulgarity,
        #[case] expected: Purity,
    ) {
        assert_eq!(Purity::from_combined(first, second), expected);
    }

    #[rstest]
    #[case("CREATING")]
    #[case("creating")]
    #[case("Creating")]
    fn action_parses_case_insensitively(#[case] token: &str) {
        assert_eq!(token.parse::<Action>().unwrap(), Action::Creating);
    }

    #[test]
    fn attribute_parse_errors_name_the_field() {
        let err = "FROBNICATING".parse::<Action>().unwrap_err();
        assert!(matches!(
            err,
            SampleError::UnknownAttribute { field: "action", .. }
        ));
        let err = "MOON".parse::<Target>().unwrap_err();
        assert!(matches!(
            err,
            SampleError::UnknownAttribute { field: "target", .. }
        ));
    }

    #[test]
    fn round_trips_through_canonical_tokens() {
        for purity in [Purity::Polluted, Purity::Lucid, Purity::Perfect] {
            assert_eq!(purity.as_str().parse::<Purity>().unwrap(), purity);
        }
        for strength in [Strength::Nothing, Strength::Overbearing] {
            assert_eq!(strength.as_str().parse::<Strength>().unwrap(), strength);
        }
    }

    #[test]
    fn grades_expose_their_numeric_values() {
        assert_eq!(Vulgarity::Vulgar.value(), 1);
        assert_eq!(Vulgarity::Precious.value(), 6);
        assert_eq!(Purity::Perfect.value(), 11);
        assert_eq!(Strength::Nothing.value(), 0);
    }
}
