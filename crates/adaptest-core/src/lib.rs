//! adaptest-core: adaptive testing engine.
//!
//! This crate defines the session data model, the item-response-theory
//! probability model, and the estimation, selection, and stopping logic that
//! drive a computerized adaptive test one item at a time.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod irt;
pub mod model;
pub mod parser;
pub mod prioritizer;
pub mod range;
pub mod selector;
pub mod stopping;
pub mod store;
