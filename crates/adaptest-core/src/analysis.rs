//! Response pattern diagnostics produced when a session finishes.
//!
//! Everything here is read-only over the session; nothing feeds back into
//! estimation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::irt::p_correct;
use crate::model::{AbilityEstimate, Session};

/// Number of responses in each of the first/last windows compared for trend.
pub const TREND_WINDOW: usize = 5;
const TREND_THRESHOLD: f64 = 0.1;

/// Direction of accuracy over the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    /// Fewer than [`TREND_WINDOW`] responses.
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Declining => write!(f, "declining"),
            Trend::Stable => write!(f, "stable"),
            Trend::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

/// Per-knowledge-point breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePointSummary {
    pub knowledge_point_id: String,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Closing report of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub total: usize,
    pub correct: usize,
    /// Fraction correct; 0 for an empty session.
    pub accuracy: f64,
    /// Mean seconds per item over responses that recorded a time.
    pub average_time_seconds: Option<f64>,
    /// Mean agreement between outcomes and the final estimate's predictions.
    /// Low values flag guessing or miscalibrated items.
    pub consistency: f64,
    pub trend: Trend,
    pub final_ability: AbilityEstimate,
    /// In order of first appearance.
    pub knowledge_points: Vec<KnowledgePointSummary>,
}

/// Analyze the response pattern of a session.
pub fn analyze(session: &Session) -> PatternReport {
    let responses = session.responses();
    let total = responses.len();
    let correct = responses.iter().filter(|r| r.is_correct).count();
    let final_ability = session.ability();

    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };

    let times: Vec<u32> = responses.iter().filter_map(|r| r.time_spent_seconds).collect();
    let average_time_seconds = (!times.is_empty())
        .then(|| times.iter().map(|&t| t as f64).sum::<f64>() / times.len() as f64);

    let consistency = if total == 0 {
        0.0
    } else {
        responses
            .iter()
            .map(|r| {
                let p = p_correct(final_ability.theta, r.difficulty_at_time, 1.0).into_logged();
                let outcome = if r.is_correct { 1.0 } else { 0.0 };
                1.0 - (p - outcome).abs()
            })
            .sum::<f64>()
            / total as f64
    };

    PatternReport {
        total,
        correct,
        accuracy,
        average_time_seconds,
        consistency,
        trend: trend(session),
        final_ability,
        knowledge_points: knowledge_point_breakdown(session),
    }
}

fn trend(session: &Session) -> Trend {
    let responses = session.responses();
    if responses.len() < TREND_WINDOW {
        return Trend::InsufficientData;
    }
    let window_accuracy = |window: &[crate::model::Response]| {
        window.iter().filter(|r| r.is_correct).count() as f64 / window.len() as f64
    };
    let first = window_accuracy(&responses[..TREND_WINDOW]);
    let last = window_accuracy(&responses[responses.len() - TREND_WINDOW..]);
    let delta = last - first;
    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn knowledge_point_breakdown(session: &Session) -> Vec<KnowledgePointSummary> {
    let mut summaries: Vec<KnowledgePointSummary> = Vec::new();
    for r in session.responses() {
        let idx = match summaries
            .iter()
            .position(|s| s.knowledge_point_id == r.knowledge_point_id)
        {
            Some(idx) => idx,
            None => {
                summaries.push(KnowledgePointSummary {
                    knowledge_point_id: r.knowledge_point_id.clone(),
                    attempts: 0,
                    correct: 0,
                    accuracy: 0.0,
                });
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[idx];
        summary.attempts += 1;
        if r.is_correct {
            summary.correct += 1;
        }
    }
    for s in &mut summaries {
        s.accuracy = s.correct as f64 / s.attempts as f64;
    }
    summaries
}
