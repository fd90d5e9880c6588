//! Core data model types for adaptest.
//!
//! Items and knowledge points are supplied by the host on every call and are
//! never mutated here. A [`Session`] owns everything that changes during a
//! test: the ability estimate, the response log, and the set of used items.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::PatternReport;
use crate::config::SessionConfig;
use crate::error::InputError;
use crate::stopping::StopReason;

/// Lowest representable ability.
pub const THETA_MIN: f64 = -3.0;
/// Highest representable ability.
pub const THETA_MAX: f64 = 3.0;
/// Smallest standard error the estimator will report.
pub const SE_MIN: f64 = 0.1;
/// Largest standard error the estimator will report.
pub const SE_MAX: f64 = 2.0;

/// Unique identifier of a test session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Current ability estimate and its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    /// Latent ability, always within `[THETA_MIN, THETA_MAX]`.
    pub theta: f64,
    /// Standard error, always within `[SE_MIN, SE_MAX]`.
    pub standard_error: f64,
}

impl AbilityEstimate {
    /// Build an estimate, clamping both components into their valid ranges.
    pub fn new(theta: f64, standard_error: f64) -> Self {
        Self {
            theta: theta.clamp(THETA_MIN, THETA_MAX),
            standard_error: standard_error.clamp(SE_MIN, SE_MAX),
        }
    }
}

impl Default for AbilityEstimate {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// A calibrated test item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the host's item pool.
    pub id: String,
    /// IRT difficulty (`b`): the ability at which P(correct) = 0.5.
    pub difficulty: f64,
    /// IRT discrimination (`a`).
    #[serde(default = "default_discrimination")]
    pub discrimination: f64,
    /// Knowledge point this item assesses.
    pub knowledge_point_id: String,
    /// Opaque reference to the item content in the host's store.
    #[serde(default)]
    pub content_ref: String,
}

fn default_discrimination() -> f64 {
    1.0
}

impl Item {
    pub fn new(id: impl Into<String>, difficulty: f64, knowledge_point_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            difficulty,
            discrimination: default_discrimination(),
            knowledge_point_id: knowledge_point_id.into(),
            content_ref: String::new(),
        }
    }

    pub fn with_discrimination(mut self, discrimination: f64) -> Self {
        self.discrimination = discrimination;
        self
    }

    pub fn with_content_ref(mut self, content_ref: impl Into<String>) -> Self {
        self.content_ref = content_ref.into();
        self
    }

    /// Reject parameters the probability model cannot use.
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.difficulty.is_finite() {
            return Err(InputError::NonFiniteParameter {
                item_id: self.id.clone(),
                parameter: "difficulty",
                value: self.difficulty,
            });
        }
        if !self.discrimination.is_finite() {
            return Err(InputError::NonFiniteParameter {
                item_id: self.id.clone(),
                parameter: "discrimination",
                value: self.discrimination,
            });
        }
        if self.discrimination <= 0.0 {
            return Err(InputError::NonPositiveDiscrimination {
                item_id: self.id.clone(),
                value: self.discrimination,
            });
        }
        Ok(())
    }
}

/// An answer payload as the host receives it from the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub item_id: String,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub time_spent_seconds: Option<u32>,
}

impl Submission {
    pub fn new(item_id: impl Into<String>, is_correct: bool) -> Self {
        Self {
            item_id: item_id.into(),
            is_correct: Some(is_correct),
            time_spent_seconds: None,
        }
    }

    pub fn with_time(mut self, seconds: u32) -> Self {
        self.time_spent_seconds = Some(seconds);
        self
    }
}

/// A recorded answer. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub item_id: String,
    pub knowledge_point_id: String,
    pub is_correct: bool,
    /// Item difficulty at the moment it was answered.
    pub difficulty_at_time: f64,
    #[serde(default)]
    pub time_spent_seconds: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

/// Lifecycle state of a session. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// State of one adaptive test.
///
/// Fields are private so that the ability estimate, response log, and status
/// can only change through the engine, which keeps the session invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    ability: AbilityEstimate,
    responses: Vec<Response>,
    used_item_ids: BTreeSet<String>,
    status: SessionStatus,
    #[serde(default)]
    stop_reason: Option<StopReason>,
    #[serde(default)]
    failure: Option<String>,
    #[serde(default)]
    report: Option<PatternReport>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Start a new session. Fails if the configuration is out of range.
    pub fn new(config: SessionConfig) -> Result<Self, InputError> {
        config.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: SessionId::new(),
            ability: AbilityEstimate::new(config.initial_theta, config.initial_se),
            config,
            responses: Vec::new(),
            used_item_ids: BTreeSet::new(),
            status: SessionStatus::Running,
            stop_reason: None,
            failure: None,
            report: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ability(&self) -> AbilityEstimate {
        self.ability
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn used_item_ids(&self) -> &BTreeSet<String> {
        &self.used_item_ids
    }

    pub fn is_used(&self, item_id: &str) -> bool {
        self.used_item_ids.contains(item_id)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn report(&self) -> Option<&PatternReport> {
        self.report.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of responses recorded for a knowledge point.
    pub fn responses_for(&self, knowledge_point_id: &str) -> usize {
        self.responses
            .iter()
            .filter(|r| r.knowledge_point_id == knowledge_point_id)
            .count()
    }

    /// Accuracy on a knowledge point, or `None` if it was never tested.
    pub fn accuracy_for(&self, knowledge_point_id: &str) -> Option<f64> {
        let (attempts, correct) = self
            .responses
            .iter()
            .filter(|r| r.knowledge_point_id == knowledge_point_id)
            .fold((0usize, 0usize), |(n, c), r| (n + 1, c + r.is_correct as usize));
        (attempts > 0).then(|| correct as f64 / attempts as f64)
    }

    pub(crate) fn record(&mut self, response: Response, ability: AbilityEstimate) {
        self.used_item_ids.insert(response.item_id.clone());
        self.responses.push(response);
        self.ability = ability;
        self.updated_at = Utc::now();
    }

    pub(crate) fn complete(&mut self, reason: StopReason, report: PatternReport) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SessionStatus::Completed;
        self.stop_reason = Some(reason);
        self.report = Some(report);
        self.updated_at = Utc::now();
    }

    pub(crate) fn fail(&mut self, reason: String) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SessionStatus::Failed;
        self.failure = Some(reason);
        self.updated_at = Utc::now();
    }

    pub(crate) fn set_report(&mut self, report: PatternReport) {
        self.report = Some(report);
    }
}

/// Curriculum level of a knowledge point. Foundations are covered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeLevel {
    Foundational,
    Applied,
    Synthesis,
}

impl KnowledgeLevel {
    /// Prioritization bonus for this level.
    pub fn bonus(self) -> f64 {
        match self {
            KnowledgeLevel::Foundational => 3.0,
            KnowledgeLevel::Applied => 2.0,
            KnowledgeLevel::Synthesis => 1.0,
        }
    }
}

impl fmt::Display for KnowledgeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeLevel::Foundational => write!(f, "foundational"),
            KnowledgeLevel::Applied => write!(f, "applied"),
            KnowledgeLevel::Synthesis => write!(f, "synthesis"),
        }
    }
}

impl FromStr for KnowledgeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "foundational" | "foundation" | "basic" => Ok(KnowledgeLevel::Foundational),
            "applied" | "application" => Ok(KnowledgeLevel::Applied),
            "synthesis" | "advanced" => Ok(KnowledgeLevel::Synthesis),
            other => Err(format!("unknown knowledge level: {other}")),
        }
    }
}

/// A curriculum topic tracked for coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePoint {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Whether this topic belongs to the core curriculum.
    #[serde(default)]
    pub is_core: bool,
    /// Host-assigned importance weight.
    #[serde(default)]
    pub importance: Option<f64>,
    #[serde(default)]
    pub level: Option<KnowledgeLevel>,
    /// Ids of knowledge points that should be mastered first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl KnowledgePoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            is_core: false,
            importance: None,
            level: None,
            prerequisites: Vec::new(),
        }
    }
}

/// Transient coverage priority of a knowledge point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePointPriority {
    pub knowledge_point_id: String,
    pub score: f64,
}
