//! Error and warning types.
//!
//! Hard failures (`InputError`, `StoreError`) reject a call before any state
//! changes. Numeric problems inside the probability model never abort a
//! session; they surface as a `NumericGuardWarning` attached to a
//! [`Guarded`] value so the caller decides whether to log or alert.

use thiserror::Error;

use crate::model::{SessionId, SessionStatus};

/// Malformed input supplied by the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// An item was supplied without a difficulty parameter.
    #[error("item '{item_id}' has no difficulty")]
    MissingDifficulty { item_id: String },

    /// An item parameter is NaN or infinite.
    #[error("item '{item_id}' has non-finite {parameter}: {value}")]
    NonFiniteParameter {
        item_id: String,
        parameter: &'static str,
        value: f64,
    },

    /// Discrimination must be strictly positive.
    #[error("item '{item_id}' has non-positive discrimination: {value}")]
    NonPositiveDiscrimination { item_id: String, value: f64 },

    /// A submission arrived without its correctness flag.
    #[error("response to item '{item_id}' is missing the correctness flag")]
    MissingCorrectness { item_id: String },

    /// The submission refers to a different item than the one supplied.
    #[error("submission is for item '{submitted}' but item '{supplied}' was supplied")]
    ItemMismatch { submitted: String, supplied: String },

    /// The item was already administered in this session.
    #[error("item '{item_id}' was already answered in this session")]
    ItemAlreadyUsed { item_id: String },

    /// The session no longer accepts answers.
    #[error("session is {status} and no longer accepts answers")]
    SessionClosed { status: SessionStatus },

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal numeric guard that replaced a computation with its neutral value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericGuardWarning {
    /// The logistic exponent was NaN; probability defaulted to 0.5.
    #[error("non-finite logistic input (theta={theta}, difficulty={difficulty}, discrimination={discrimination}); using p=0.5")]
    NonFiniteProbability {
        theta: f64,
        difficulty: f64,
        discrimination: f64,
    },

    /// Fisher information was not finite; defaulted to 0.
    #[error("non-finite information (theta={theta}, difficulty={difficulty}, discrimination={discrimination}); using 0")]
    NonFiniteInformation {
        theta: f64,
        difficulty: f64,
        discrimination: f64,
    },

    /// A knowledge-point priority was not finite; all priorities fell back to 1.0.
    #[error("non-finite priority for knowledge point '{knowledge_point_id}'; using uniform scores")]
    NonFinitePriority { knowledge_point_id: String },
}

/// A computed value plus an optional warning describing a degraded result.
#[derive(Debug, Clone, PartialEq)]
pub struct Guarded<T> {
    pub value: T,
    pub warning: Option<NumericGuardWarning>,
}

impl<T> Guarded<T> {
    /// A value computed without intervention.
    pub fn exact(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    /// A neutral value substituted because of `warning`.
    pub fn degraded(value: T, warning: NumericGuardWarning) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }

    /// Return the value, logging the warning if there is one.
    pub fn into_logged(self) -> T {
        if let Some(w) = &self.warning {
            tracing::warn!("{w}");
        }
        self.value
    }
}

/// Failures of the session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's lock was poisoned by a panicking writer.
    #[error("session store lock poisoned")]
    Poisoned,

    /// A backend-specific failure reported by a host store.
    #[error("session store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by [`crate::store::SessionService`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
}
