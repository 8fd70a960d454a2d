//! Krystallium sample domain model.
//!
//! The reader driver transports trait tokens as opaque strings; this crate
//! gives them meaning. It models the attribute vocabulary
//! ([`Action`], [`Target`], [`Vulgarity`], [`Purity`], [`Strength`]), the
//! three sample shapes a tag can hold, the derivation rules between them
//! (vulgarity from a raw sample's pairs, purity from combining two raws),
//! and the weighted per-origin generator used to mint new samples.
//!
//! Wire mapping: every attribute parses case-insensitively from the
//! upper-cased tokens the readers echo, and renders back to its canonical
//! token for `WRITESAMPLE` commands.

pub mod attribute;
pub mod error;
pub mod generate;
pub mod sample;

pub use attribute::{Action, Purity, Strength, Target, Vulgarity};
pub use error::{Result, SampleError};
pub use generate::{generate_blood, generate_raw, generate_refined};
pub use sample::{BloodSample, RawSample, RefinedSample, Sample};
