//! Weighted sample generation, per mining site.
//!
//! Every site stocks a pool of candidate actions and targets, each carrying
//! a rarity-tier weight. A generated sample draws its action and target
//! independently from those pools; the draw's rarity score is
//! `2 / (action weight + target weight)`, so a fully common draw scores
//! `1.0` and scores climb as the tiers thin out.
//!
//! Sites are matched by their exact label. A known site whose pools are
//! still unstocked yields [`SampleError::EmptyPool`], an unknown label
//! yields [`SampleError::UnknownOrigin`].

use rand::Rng;
use rand::seq::SliceRandom;

use crate::attribute::{Action, Strength, Target};
use crate::error::{Result, SampleError};
use crate::sample::{BloodSample, RawSample, RefinedSample};

/// Weight of a common pool entry.
pub const COMMON_WEIGHT: f64 = 1.0;
/// Weight of an uncommon pool entry.
pub const UNCOMMON_WEIGHT: f64 = 0.25;
/// Weight of a rare pool entry. No site stocks one yet.
pub const RARE_WEIGHT: f64 = 0.05;

/// Candidate attributes of one site, each with its tier weight.
#[derive(Debug, Clone, Copy)]
struct AttributePool {
    actions: &'static [(Action, f64)],
    targets: &'static [(Target, f64)],
}

const EMPTY_POOL: AttributePool = AttributePool {
    actions: &[],
    targets: &[],
};

fn raw_pool(origin: &str) -> Result<AttributePool> {
    match origin {
        "1" => Ok(AttributePool {
            actions: &[
                (Action::Creating, COMMON_WEIGHT),
                (Action::Encumbering, COMMON_WEIGHT),
                (Action::Heating, UNCOMMON_WEIGHT),
                (Action::Insulating, UNCOMMON_WEIGHT),
                (Action::Solidifying, UNCOMMON_WEIGHT),
            ],
            targets: &[
                (Target::Krystal, COMMON_WEIGHT),
                (Target::Energy, UNCOMMON_WEIGHT),
                (Target::Solid, UNCOMMON_WEIGHT),
            ],
        }),
        // Sites surveyed but not yet catalogued.
        "2" | "3" | "4" => Ok(EMPTY_POOL),
        "5" => Ok(AttributePool {
            actions: &[
                (Action::Contracting, COMMON_WEIGHT),
                (Action::Fortifying, UNCOMMON_WEIGHT),
                (Action::Lightening, UNCOMMON_WEIGHT),
            ],
            targets: &[
                (Target::Liquid, COMMON_WEIGHT),
                (Target::Light, UNCOMMON_WEIGHT),
            ],
        }),
        _ => Err(SampleError::UnknownOrigin {
            value: origin.to_string(),
        }),
    }
}

fn blood_pool(origin: &str) -> Result<AttributePool> {
    match origin {
        "water" => Ok(AttributePool {
            actions: &[(Action::Increasing, COMMON_WEIGHT)],
            targets: &[(Target::Krystal, COMMON_WEIGHT)],
        }),
        "mountain" | "forest" | "plains" => Ok(EMPTY_POOL),
        _ => Err(SampleError::UnknownOrigin {
            value: origin.to_string(),
        }),
    }
}

/// One weighted action/target draw and its rarity score.
struct Draw {
    action: Action,
    target: Target,
    rarity: f64,
}

fn draw(rng: &mut impl Rng, origin: &str, pool: &AttributePool) -> Result<Draw> {
    let (action, action_weight) = pool
        .actions
        .choose_weighted(rng, |(_, weight)| *weight)
        .map_err(|_| SampleError::empty_pool(origin, "action"))?;
    let (target, target_weight) = pool
        .targets
        .choose_weighted(rng, |(_, weight)| *weight)
        .map_err(|_| SampleError::empty_pool(origin, "target"))?;
    Ok(Draw {
        action: *action,
        target: *target,
        rarity: 2.0 / (action_weight + target_weight),
    })
}

/// Generate a raw sample from one site.
///
/// Two independent draws fill the positive and negative pairs; the sample's
/// rarity is their average and its vulgarity falls out of the pairs. Fresh
/// samples are never depleted.
///
/// # Errors
/// Returns `SampleError::UnknownOrigin` for a label outside the site
/// tables and `SampleError::EmptyPool` for a site with nothing stocked.
pub fn generate_raw(rng: &mut impl Rng, origin: &str) -> Result<RawSample> {
    let pool = raw_pool(origin)?;
    let positive = draw(rng, origin, &pool)?;
    let negative = draw(rng, origin, &pool)?;
    Ok(RawSample::new(
        positive.action,
        positive.target,
        negative.action,
        negative.target,
        origin,
        (positive.rarity + negative.rarity) / 2.0,
        false,
    ))
}

/// Generate and refine one raw sample from each of two sites.
///
/// # Errors
/// Fails like [`generate_raw`] for whichever site is bad.
pub fn generate_refined(
    rng: &mut impl Rng,
    first_origin: &str,
    second_origin: &str,
) -> Result<RefinedSample> {
    let first = generate_raw(rng, first_origin)?;
    let second = generate_raw(rng, second_origin)?;
    Ok(RefinedSample::combine(&first, &second))
}

/// Generate a blood sample from one site, with a uniformly random strength
/// between Weak and Overbearing.
///
/// # Errors
/// Returns `SampleError::UnknownOrigin` for a label outside the site
/// tables and `SampleError::EmptyPool` for a site with nothing stocked.
pub fn generate_blood(rng: &mut impl Rng, origin: &str) -> Result<BloodSample> {
    let pool = blood_pool(origin)?;
    let drawn = draw(rng, origin, &pool)?;
    let strength = match rng.gen_range(1..=4u8) {
        1 => Strength::Weak,
        2 => Strength::Medium,
        3 => Strength::Strong,
        _ => Strength::Overbearing,
    };
    Ok(BloodSample::new(drawn.action, drawn.target, strength, origin))
}
