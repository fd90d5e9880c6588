//! Knowledge-point coverage priorities.
//!
//! Scores are additive:
//!
//! | signal                        | contribution        |
//! |-------------------------------|---------------------|
//! | not yet tested this session   | +10                 |
//! | core curriculum               | +5                  |
//! | importance                    | +importance × 2     |
//! | prerequisite mastery ratio    | +ratio × 3          |
//! | level                         | +3 / +2 / +1        |
//!
//! The output is a hint for ordering the candidate pool, so a broken score
//! never fails the call: every knowledge point falls back to a uniform 1.0.

use crate::error::{Guarded, NumericGuardWarning};
use crate::model::{KnowledgePoint, KnowledgePointPriority, Session};

const UNTESTED_BONUS: f64 = 10.0;
const CORE_BONUS: f64 = 5.0;
const IMPORTANCE_WEIGHT: f64 = 2.0;
const PREREQUISITE_WEIGHT: f64 = 3.0;
/// Assumed accuracy on a prerequisite with no responses yet.
const UNKNOWN_MASTERY: f64 = 0.5;
const FALLBACK_SCORE: f64 = 1.0;

/// Rank knowledge points by coverage priority, highest first.
///
/// Equal scores keep their input order.
pub fn prioritize(
    session: &Session,
    knowledge_points: &[KnowledgePoint],
) -> Guarded<Vec<KnowledgePointPriority>> {
    let mut ranked = Vec::with_capacity(knowledge_points.len());
    for kp in knowledge_points {
        let score = score(session, kp);
        if !score.is_finite() {
            let warning = NumericGuardWarning::NonFinitePriority {
                knowledge_point_id: kp.id.clone(),
            };
            tracing::warn!("{warning}");
            return Guarded::degraded(uniform(knowledge_points), warning);
        }
        ranked.push(KnowledgePointPriority {
            knowledge_point_id: kp.id.clone(),
            score,
        });
    }

    // Scores are finite here, so the comparison is total.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Guarded::exact(ranked)
}

fn score(session: &Session, kp: &KnowledgePoint) -> f64 {
    let mut score = 0.0;
    if session.responses_for(&kp.id) == 0 {
        score += UNTESTED_BONUS;
    }
    if kp.is_core {
        score += CORE_BONUS;
    }
    if let Some(importance) = kp.importance {
        score += importance * IMPORTANCE_WEIGHT;
    }
    score += prerequisite_mastery(session, kp) * PREREQUISITE_WEIGHT;
    if let Some(level) = kp.level {
        score += level.bonus();
    }
    score
}

/// Mean accuracy over a knowledge point's prerequisites.
///
/// A knowledge point without prerequisites has nothing blocking it and
/// counts as fully ready.
pub fn prerequisite_mastery(session: &Session, kp: &KnowledgePoint) -> f64 {
    if kp.prerequisites.is_empty() {
        return 1.0;
    }
    let total: f64 = kp
        .prerequisites
        .iter()
        .map(|id| session.accuracy_for(id).unwrap_or(UNKNOWN_MASTERY))
        .sum();
    total / kp.prerequisites.len() as f64
}

fn uniform(knowledge_points: &[KnowledgePoint]) -> Vec<KnowledgePointPriority> {
    knowledge_points
        .iter()
        .map(|kp| KnowledgePointPriority {
            knowledge_point_id: kp.id.clone(),
            score: FALLBACK_SCORE,
        })
        .collect()
}
