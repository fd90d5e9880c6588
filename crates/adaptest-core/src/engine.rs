//! Session orchestrator.
//!
//! Wires estimation, selection, and stopping around an explicit [`Session`]
//! value. The engine holds only configuration; every call receives the
//! session it works on, so the host decides where sessions live.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{analyze, PatternReport};
use crate::config::{EngineConfig, SessionConfig};
use crate::error::{InputError, NumericGuardWarning};
use crate::estimator;
use crate::model::{AbilityEstimate, Item, KnowledgePoint, Response, Session, SessionStatus, Submission};
use crate::prioritizer::prioritize;
use crate::range::adjust_range;
use crate::selector::{select_next, Selection};
use crate::stopping::{self, StopDecision, StopReason};

/// Per-session overrides of the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOverrides {
    #[serde(default)]
    pub min_items: Option<usize>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub target_precision: Option<f64>,
    #[serde(default)]
    pub initial_theta: Option<f64>,
    #[serde(default)]
    pub initial_se: Option<f64>,
}

impl SessionOverrides {
    pub fn apply(&self, defaults: &SessionConfig) -> SessionConfig {
        SessionConfig {
            min_items: self.min_items.unwrap_or(defaults.min_items),
            max_items: self.max_items.unwrap_or(defaults.max_items),
            target_precision: self.target_precision.unwrap_or(defaults.target_precision),
            initial_theta: self.initial_theta.unwrap_or(defaults.initial_theta),
            initial_se: self.initial_se.unwrap_or(defaults.initial_se),
        }
    }
}

/// Result of asking for the next item.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep<'a> {
    /// Administer this item next.
    Item(Selection<'a>),
    /// The test is over.
    Finished(PatternReport),
}

impl NextStep<'_> {
    pub fn is_finished(&self) -> bool {
        matches!(self, NextStep::Finished(_))
    }
}

/// Result of recording an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub estimate: AbilityEstimate,
    /// Set when the estimate was left unchanged by a numeric guard.
    pub warning: Option<NumericGuardWarning>,
    pub decision: StopDecision,
    pub status: SessionStatus,
}

/// The adaptive testing engine.
#[derive(Debug, Clone, Default)]
pub struct CatEngine {
    config: EngineConfig,
}

impl CatEngine {
    pub fn new(config: EngineConfig) -> Result<Self, InputError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a session with the configured defaults and the given overrides.
    pub fn start(&self, overrides: &SessionOverrides) -> Result<Session, InputError> {
        let session = Session::new(overrides.apply(&self.config.session))?;
        tracing::info!(
            session = %session.id(),
            min_items = session.config().min_items,
            max_items = session.config().max_items,
            "session started"
        );
        Ok(session)
    }

    /// Choose the next item, or finish the session.
    ///
    /// Stopping rules are evaluated first. Candidates are ordered by
    /// knowledge-point priority, then restricted to the difficulty band around
    /// the current estimate; if the band is empty the whole pool is scored.
    /// An exhausted pool completes the session.
    pub fn next_item<'a>(
        &self,
        session: &mut Session,
        items: &'a [Item],
        knowledge_points: &[KnowledgePoint],
    ) -> NextStep<'a> {
        if session.status().is_terminal() {
            return NextStep::Finished(self.finalize(session));
        }

        if let StopDecision::Stop(reason) = stopping::evaluate(session, &self.config.stopping) {
            return NextStep::Finished(self.complete(session, reason));
        }

        let ordered = order_by_priority(session, items, knowledge_points);
        let band = adjust_range(session.ability());
        let in_band = ordered.iter().copied().filter(|i| band.contains(i.difficulty));

        let selection = select_next(session, in_band, &self.config.selection)
            .or_else(|| select_next(session, ordered.iter().copied(), &self.config.selection));

        match selection {
            Some(selection) => NextStep::Item(selection),
            None => NextStep::Finished(self.complete(session, StopReason::PoolExhausted)),
        }
    }

    /// Record the learner's answer to `item`.
    ///
    /// All validation happens before the session is touched, so a rejected
    /// answer leaves it unchanged. If a stopping rule fires the session is
    /// completed.
    pub fn record_answer(
        &self,
        session: &mut Session,
        item: &Item,
        submission: &Submission,
    ) -> Result<AnswerOutcome, InputError> {
        if session.status().is_terminal() {
            return Err(InputError::SessionClosed {
                status: session.status(),
            });
        }
        item.validate()?;
        if submission.item_id != item.id {
            return Err(InputError::ItemMismatch {
                submitted: submission.item_id.clone(),
                supplied: item.id.clone(),
            });
        }
        if session.is_used(&item.id) {
            return Err(InputError::ItemAlreadyUsed {
                item_id: item.id.clone(),
            });
        }
        let is_correct = submission
            .is_correct
            .ok_or_else(|| InputError::MissingCorrectness {
                item_id: item.id.clone(),
            })?;

        let update = estimator::update(
            session.ability(),
            is_correct,
            item.difficulty,
            item.discrimination,
        );
        if let Some(w) = &update.warning {
            tracing::warn!(session = %session.id(), item = %item.id, "{w}");
        }

        session.record(
            Response {
                item_id: item.id.clone(),
                knowledge_point_id: item.knowledge_point_id.clone(),
                is_correct,
                difficulty_at_time: item.difficulty,
                time_spent_seconds: submission.time_spent_seconds,
                timestamp: chrono::Utc::now(),
            },
            update.value,
        );

        let decision = stopping::evaluate(session, &self.config.stopping);
        if let StopDecision::Stop(reason) = decision {
            self.complete(session, reason);
        }

        Ok(AnswerOutcome {
            estimate: session.ability(),
            warning: update.warning,
            decision,
            status: session.status(),
        })
    }

    /// Produce the closing report. Idempotent.
    ///
    /// A running session is completed; a failed session keeps its status.
    pub fn finalize(&self, session: &mut Session) -> PatternReport {
        if let Some(report) = session.report() {
            return report.clone();
        }
        match session.status() {
            SessionStatus::Running => self.complete(session, StopReason::Finalized),
            _ => {
                let report = analyze(session);
                session.set_report(report.clone());
                report
            }
        }
    }

    /// Mark the session failed. Has no effect on a finished session.
    pub fn fail(&self, session: &mut Session, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(session = %session.id(), "session failed: {reason}");
        session.fail(reason);
    }

    fn complete(&self, session: &mut Session, reason: StopReason) -> PatternReport {
        let report = analyze(session);
        session.complete(reason, report.clone());
        tracing::info!(
            session = %session.id(),
            %reason,
            items = report.total,
            theta = report.final_ability.theta,
            se = report.final_ability.standard_error,
            "session completed"
        );
        report
    }
}

/// Stable-order the pool by knowledge-point priority. Items on unknown
/// knowledge points keep their relative order after all ranked ones.
fn order_by_priority<'a>(
    session: &Session,
    items: &'a [Item],
    knowledge_points: &[KnowledgePoint],
) -> Vec<&'a Item> {
    let mut ordered: Vec<&'a Item> = items.iter().collect();
    if knowledge_points.is_empty() {
        return ordered;
    }
    let ranked = prioritize(session, knowledge_points).value;
    let rank: HashMap<&str, usize> = ranked
        .iter()
        .enumerate()
        .map(|(i, p)| (p.knowledge_point_id.as_str(), i))
        .collect();
    ordered.sort_by_key(|item| {
        rank.get(item.knowledge_point_id.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });
    ordered
}
