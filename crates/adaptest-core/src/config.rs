//! Engine configuration and loading.
//!
//! Every value has a documented default, so an empty TOML file (or no file at
//! all) yields a working engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::model::{SE_MAX, SE_MIN, THETA_MAX, THETA_MIN};

/// Per-session options. Any field may be overridden when a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Responses required before any stopping rule may end the test.
    #[serde(default = "default_min_items")]
    pub min_items: usize,
    /// Hard cap on the number of administered items.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Stop once the standard error falls to this value.
    #[serde(default = "default_target_precision")]
    pub target_precision: f64,
    #[serde(default)]
    pub initial_theta: f64,
    #[serde(default = "default_initial_se")]
    pub initial_se: f64,
}

fn default_min_items() -> usize {
    10
}
fn default_max_items() -> usize {
    30
}
fn default_target_precision() -> f64 {
    0.3
}
fn default_initial_se() -> f64 {
    1.0
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_items: default_min_items(),
            max_items: default_max_items(),
            target_precision: default_target_precision(),
            initial_theta: 0.0,
            initial_se: default_initial_se(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        if self.max_items == 0 {
            return Err(InputError::InvalidConfig("max_items must be at least 1".into()));
        }
        if self.min_items > self.max_items {
            return Err(InputError::InvalidConfig(format!(
                "min_items ({}) exceeds max_items ({})",
                self.min_items, self.max_items
            )));
        }
        if !(self.target_precision.is_finite() && self.target_precision > 0.0) {
            return Err(InputError::InvalidConfig(format!(
                "target_precision must be positive, got {}",
                self.target_precision
            )));
        }
        if !(THETA_MIN..=THETA_MAX).contains(&self.initial_theta) {
            return Err(InputError::InvalidConfig(format!(
                "initial_theta must be within [{THETA_MIN}, {THETA_MAX}], got {}",
                self.initial_theta
            )));
        }
        if !(SE_MIN..=SE_MAX).contains(&self.initial_se) {
            return Err(InputError::InvalidConfig(format!(
                "initial_se must be within [{SE_MIN}, {SE_MAX}], got {}",
                self.initial_se
            )));
        }
        Ok(())
    }
}

/// Tuning of the item selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionParams {
    /// Multiplier applied to items whose knowledge point is under-covered.
    #[serde(default = "default_breadth_bonus")]
    pub breadth_bonus: f64,
    /// A knowledge point with fewer responses than this is under-covered.
    #[serde(default = "default_breadth_threshold")]
    pub breadth_threshold: usize,
}

fn default_breadth_bonus() -> f64 {
    2.0
}
fn default_breadth_threshold() -> usize {
    2
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            breadth_bonus: default_breadth_bonus(),
            breadth_threshold: default_breadth_threshold(),
        }
    }
}

/// Tuning of the streak-based early stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppingParams {
    /// Number of trailing identical outcomes that count as a streak.
    #[serde(default = "default_streak_length")]
    pub streak_length: usize,
    /// A streak stops the test once this fraction of `max_items` is used.
    #[serde(default = "default_streak_stop_fraction")]
    pub streak_stop_fraction: f64,
}

fn default_streak_length() -> usize {
    5
}
fn default_streak_stop_fraction() -> f64 {
    0.8
}

impl Default for StoppingParams {
    fn default() -> Self {
        Self {
            streak_length: default_streak_length(),
            streak_stop_fraction: default_streak_stop_fraction(),
        }
    }
}

/// Top-level adaptest configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Defaults for new sessions.
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub selection: SelectionParams,
    #[serde(default)]
    pub stopping: StoppingParams,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        self.session.validate()?;
        if !(self.selection.breadth_bonus.is_finite() && self.selection.breadth_bonus > 0.0) {
            return Err(InputError::InvalidConfig(format!(
                "breadth_bonus must be positive, got {}",
                self.selection.breadth_bonus
            )));
        }
        if self.stopping.streak_length == 0 {
            return Err(InputError::InvalidConfig(
                "streak_length must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.stopping.streak_stop_fraction) {
            return Err(InputError::InvalidConfig(format!(
                "streak_stop_fraction must be within [0, 1], got {}",
                self.stopping.streak_stop_fraction
            )));
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `ADAPTEST_MIN_ITEMS`, `ADAPTEST_MAX_ITEMS`,
/// `ADAPTEST_TARGET_PRECISION`.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML string into an `EngineConfig`.
pub fn parse_config_str(content: &str) -> Result<EngineConfig> {
    Ok(toml::from_str::<EngineConfig>(content)?)
}

fn apply_env_overrides(config: &mut EngineConfig) -> Result<()> {
    if let Ok(v) = std::env::var("ADAPTEST_MIN_ITEMS") {
        config.session.min_items = v
            .trim()
            .parse()
            .with_context(|| format!("invalid ADAPTEST_MIN_ITEMS: '{v}'"))?;
    }
    if let Ok(v) = std::env::var("ADAPTEST_MAX_ITEMS") {
        config.session.max_items = v
            .trim()
            .parse()
            .with_context(|| format!("invalid ADAPTEST_MAX_ITEMS: '{v}'"))?;
    }
    if let Ok(v) = std::env::var("ADAPTEST_TARGET_PRECISION") {
        config.session.target_precision = v
            .trim()
            .parse()
            .with_context(|| format!("invalid ADAPTEST_TARGET_PRECISION: '{v}'"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.session.min_items, 10);
        assert_eq!(config.session.max_items, 30);
        assert_eq!(config.session.target_precision, 0.3);
        assert_eq!(config.session.initial_theta, 0.0);
        assert_eq!(config.session.initial_se, 1.0);
        assert_eq!(config.selection.breadth_bonus, 2.0);
        assert_eq!(config.selection.breadth_threshold, 2);
        assert_eq!(config.stopping.streak_length, 5);
        assert_eq!(config.stopping.streak_stop_fraction, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
[session]
max_items = 20
target_precision = 0.25

[stopping]
streak_stop_fraction = 0.9
"#;
        let config = parse_config_str(toml_str).unwrap();
        assert_eq!(config.session.max_items, 20);
        assert_eq!(config.session.min_items, 10);
        assert_eq!(config.session.target_precision, 0.25);
        assert_eq!(config.stopping.streak_stop_fraction, 0.9);
        assert_eq!(config.stopping.streak_length, 5);
        assert_eq!(config.selection, SelectionParams::default());
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_config_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn rejects_min_above_max() {
        let config = SessionConfig {
            min_items: 40,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(InputError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_out_of_range_initial_values() {
        let config = SessionConfig {
            initial_theta: 4.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SessionConfig {
            initial_se: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptest.toml");
        std::fs::write(&path, "[session]\nmin_items = 5\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.session.min_items, 5);
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("does-not-exist.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
