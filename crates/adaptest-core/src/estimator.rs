//! Incremental ability estimation.
//!
//! Each response moves θ by one Newton-like step against the item's Fisher
//! information and shrinks the standard error by the information gained.
//! The cost is O(1) per response; the response history is never re-fit.

use crate::error::{Guarded, NumericGuardWarning};
use crate::irt::{information, p_correct};
use crate::model::{AbilityEstimate, SE_MAX, SE_MIN, THETA_MAX, THETA_MIN};

/// Update an ability estimate after one response.
///
/// Zero information leaves the estimate unchanged. Numeric guards raised by
/// the probability model are carried on the result.
pub fn update(
    current: AbilityEstimate,
    is_correct: bool,
    difficulty: f64,
    discrimination: f64,
) -> Guarded<AbilityEstimate> {
    let p = p_correct(current.theta, difficulty, discrimination);
    let info = information(current.theta, difficulty, discrimination);
    let warning: Option<NumericGuardWarning> = p.warning.or(info.warning);

    if info.value <= 0.0 || warning.is_some() {
        tracing::debug!(
            theta = current.theta,
            difficulty,
            "no information from response; estimate unchanged"
        );
        return Guarded {
            value: current,
            warning,
        };
    }

    let delta = if is_correct {
        discrimination * (1.0 - p.value) / info.value
    } else {
        -discrimination * p.value / info.value
    };

    let theta = (current.theta + delta).clamp(THETA_MIN, THETA_MAX);
    let precision = 1.0 / (current.standard_error * current.standard_error) + info.value;
    let standard_error = (1.0 / precision.sqrt()).clamp(SE_MIN, SE_MAX);

    tracing::debug!(
        is_correct,
        difficulty,
        from = current.theta,
        to = theta,
        se = standard_error,
        "ability updated"
    );

    Guarded::exact(AbilityEstimate {
        theta,
        standard_error,
    })
}
