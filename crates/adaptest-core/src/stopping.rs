//! Stopping rules.
//!
//! Evaluated fresh on every "next item" request; nothing is cached between
//! calls. Rules are checked in order and the first match decides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StoppingParams;
use crate::model::Session;

/// Why a test ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The item budget was used up.
    MaxItemsReached,
    /// The standard error reached the target precision.
    PrecisionReached,
    /// A long run of identical outcomes late in the test.
    StreakEarlyStop,
    /// No eligible item remained in the candidate pool.
    PoolExhausted,
    /// The host ended the test explicitly.
    Finalized,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxItemsReached => write!(f, "max_items_reached"),
            StopReason::PrecisionReached => write!(f, "precision_reached"),
            StopReason::StreakEarlyStop => write!(f, "streak_early_stop"),
            StopReason::PoolExhausted => write!(f, "pool_exhausted"),
            StopReason::Finalized => write!(f, "finalized"),
        }
    }
}

/// Outcome of evaluating the stopping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum StopDecision {
    Continue,
    Stop(StopReason),
}

impl StopDecision {
    pub fn should_stop(self) -> bool {
        matches!(self, StopDecision::Stop(_))
    }
}

/// Decide whether the session should continue.
pub fn evaluate(session: &Session, params: &StoppingParams) -> StopDecision {
    let config = session.config();
    let count = session.responses().len();

    if count < config.min_items {
        return StopDecision::Continue;
    }
    if count >= config.max_items {
        return StopDecision::Stop(StopReason::MaxItemsReached);
    }
    if session.ability().standard_error <= config.target_precision {
        return StopDecision::Stop(StopReason::PrecisionReached);
    }
    if has_streak(session, params.streak_length) {
        let cutoff = params.streak_stop_fraction * config.max_items as f64;
        if (count as f64) < cutoff {
            return StopDecision::Continue;
        }
        return StopDecision::Stop(StopReason::StreakEarlyStop);
    }
    StopDecision::Continue
}

/// Whether the last `length` outcomes are all correct or all incorrect.
fn has_streak(session: &Session, length: usize) -> bool {
    let responses = session.responses();
    if length == 0 || responses.len() < length {
        return false;
    }
    let tail = &responses[responses.len() - length..];
    let first = tail[0].is_correct;
    tail.iter().all(|r| r.is_correct == first)
}
