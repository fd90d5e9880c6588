//! Two-parameter logistic (2PL) item response model.
//!
//! P(correct | θ, a, b) = 1 / (1 + exp(-a·(θ - b)))
//!
//! Fisher information of one item at ability θ is a²·P·(1 - P), which peaks
//! where θ equals the item difficulty.

use crate::error::{Guarded, NumericGuardWarning};

/// Beyond this magnitude `exp` overflows; the probability is saturated instead.
pub const EXPONENT_LIMIT: f64 = 700.0;

/// Probability of a correct response.
///
/// Returns a degraded `0.5` if the logistic exponent is NaN.
pub fn p_correct(theta: f64, difficulty: f64, discrimination: f64) -> Guarded<f64> {
    let z = discrimination * (theta - difficulty);
    if z.is_nan() {
        return Guarded::degraded(
            0.5,
            NumericGuardWarning::NonFiniteProbability {
                theta,
                difficulty,
                discrimination,
            },
        );
    }
    if z > EXPONENT_LIMIT {
        return Guarded::exact(1.0);
    }
    if z < -EXPONENT_LIMIT {
        return Guarded::exact(0.0);
    }
    Guarded::exact(1.0 / (1.0 + (-z).exp()))
}

/// Fisher information contributed by an item at ability `theta`.
///
/// Returns a degraded `0.0` if the probability was degraded or the product is
/// not finite.
pub fn information(theta: f64, difficulty: f64, discrimination: f64) -> Guarded<f64> {
    let p = p_correct(theta, difficulty, discrimination);
    if p.is_degraded() {
        return Guarded {
            value: 0.0,
            warning: p.warning,
        };
    }
    let info = discrimination * discrimination * p.value * (1.0 - p.value);
    if !info.is_finite() {
        return Guarded::degraded(
            0.0,
            NumericGuardWarning::NonFiniteInformation {
                theta,
                difficulty,
                discrimination,
            },
        );
    }
    Guarded::exact(info.max(0.0))
}
