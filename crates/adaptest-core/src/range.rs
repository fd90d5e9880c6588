//! Difficulty band around the current ability estimate.
//!
//! The band is a pre-filter for the candidate pool. It widens while the
//! estimate is uncertain and narrows once it has converged.

use serde::{Deserialize, Serialize};

use crate::model::{AbilityEstimate, Item, THETA_MAX, THETA_MIN};

const BASE_RANGE: f64 = 1.5;
const WIDE_MULTIPLIER: f64 = 1.5;
const NARROW_MULTIPLIER: f64 = 0.8;
const MIN_WIDTH: f64 = 0.5;

/// Inclusive difficulty bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRange {
    pub min: f64,
    pub max: f64,
}

impl DifficultyRange {
    pub fn contains(&self, difficulty: f64) -> bool {
        (self.min..=self.max).contains(&difficulty)
    }

    /// Items whose difficulty falls inside the band, in pool order.
    pub fn filter<'a>(&self, pool: &'a [Item]) -> Vec<&'a Item> {
        pool.iter().filter(|i| self.contains(i.difficulty)).collect()
    }
}

/// Compute the acceptable difficulty band for an ability estimate.
pub fn adjust_range(ability: AbilityEstimate) -> DifficultyRange {
    let multiplier = if ability.standard_error > 1.0 {
        WIDE_MULTIPLIER
    } else if ability.standard_error < 0.3 {
        NARROW_MULTIPLIER
    } else {
        1.0
    };
    let range = BASE_RANGE * multiplier;

    let max = (ability.theta + range).clamp(THETA_MIN, THETA_MAX);
    let mut min = (ability.theta - range).clamp(THETA_MIN, THETA_MAX);
    if min >= max {
        min = max - MIN_WIDTH;
    }
    DifficultyRange { min, max }
}
