//! Configuration loading for Flowstate.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.flowstate/config.toml`)
//! 3. User config (`~/.flowstate/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Without any config the engine runs with
//! the constants in [`crate::core::tuning`].

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::tuning;
use crate::error::{FlowError, Result};

/// Main configuration struct for Flowstate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Flow-state model parameters.
    pub model: ModelConfig,
    /// JSONL event log configuration.
    pub event_log: EventLogConfig,
}

/// Flow-state model parameters.
///
/// Defaults are the constants in [`crate::core::tuning`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Skill delta for `game` events.
    pub game_skill_delta: f64,
    /// Skill delta for `narrative` and `dao` events.
    pub default_skill_delta: f64,
    /// Multiplier from payload difficulty to challenge delta.
    pub challenge_rate: f64,
    /// Difficulty used when the payload has none.
    pub default_difficulty: f64,
    /// Match score above which difficulty should decrease.
    pub anxiety_threshold: f64,
    /// Match score below which difficulty should increase.
    pub boredom_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            game_skill_delta: tuning::GAME_SKILL_DELTA,
            default_skill_delta: tuning::DEFAULT_SKILL_DELTA,
            challenge_rate: tuning::CHALLENGE_RATE,
            default_difficulty: tuning::DEFAULT_DIFFICULTY,
            anxiety_threshold: tuning::ANXIETY_THRESHOLD,
            boredom_threshold: tuning::BOREDOM_THRESHOLD,
        }
    }
}

impl ModelConfig {
    /// Check if a delta, rate, or default difficulty is valid (finite, >= 0).
    ///
    /// A negative value would let an estimate shrink.
    pub fn is_valid_rate(value: f64) -> bool {
        value.is_finite() && value >= 0.0
    }

    /// Check if a threshold is valid (finite, within the match score range).
    pub fn is_valid_threshold(value: f64) -> bool {
        value.is_finite() && (tuning::MATCH_SCORE_MIN..=tuning::MATCH_SCORE_MAX).contains(&value)
    }

    /// Validate every parameter.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("game_skill_delta", self.game_skill_delta),
            ("default_skill_delta", self.default_skill_delta),
            ("challenge_rate", self.challenge_rate),
            ("default_difficulty", self.default_difficulty),
        ];
        for (name, value) in rates {
            if !Self::is_valid_rate(value) {
                return Err(FlowError::config(format!(
                    "model.{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        let thresholds = [
            ("anxiety_threshold", self.anxiety_threshold),
            ("boredom_threshold", self.boredom_threshold),
        ];
        for (name, value) in thresholds {
            if !Self::is_valid_threshold(value) {
                return Err(FlowError::config(format!(
                    "model.{} must be within [-1.0, 1.0], got {}",
                    name, value
                )));
            }
        }

        if self.boredom_threshold >= self.anxiety_threshold {
            return Err(FlowError::config(format!(
                "model.boredom_threshold ({}) must be below model.anxiety_threshold ({})",
                self.boredom_threshold, self.anxiety_threshold
            )));
        }

        Ok(())
    }
}

/// JSONL event log configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventLogConfig {
    /// Whether processed events are appended to a JSONL file.
    ///
    /// Unset means "inherit from the layer below"; off when no layer sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Log file path. Defaults to `<flowstate_home>/events.jsonl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl EventLogConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// The file events are written to, if logging is enabled.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.is_enabled() {
            return None;
        }
        self.path.clone().or_else(default_event_log_path)
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config.ensure_valid_model()
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config.ensure_valid_model()
    }

    /// Load user config from `~/.flowstate/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = flowstate_home()?;
        Self::load_from_file(&home.join("config.toml")).ok()
    }

    /// Load project config from `.flowstate/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = cwd.join(".flowstate").join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| FlowError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| FlowError::config(e.to_string()))
    }

    /// Fall back to the default model if the layered result is inconsistent.
    fn ensure_valid_model(mut self) -> Self {
        if let Err(e) = self.model.validate() {
            tracing::warn!("{} (using default model parameters)", e);
            self.model = ModelConfig::default();
        }
        self
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        override_f64(
            "FLOWSTATE_ANXIETY_THRESHOLD",
            &mut self.model.anxiety_threshold,
            ModelConfig::is_valid_threshold,
        );
        override_f64(
            "FLOWSTATE_BOREDOM_THRESHOLD",
            &mut self.model.boredom_threshold,
            ModelConfig::is_valid_threshold,
        );
        override_f64(
            "FLOWSTATE_CHALLENGE_RATE",
            &mut self.model.challenge_rate,
            ModelConfig::is_valid_rate,
        );

        // FLOWSTATE_EVENT_LOG
        if let Ok(val) = env::var("FLOWSTATE_EVENT_LOG") {
            self.event_log.enabled = Some(val == "true" || val == "1");
        }

        // FLOWSTATE_EVENT_LOG_PATH
        if let Ok(val) = env::var("FLOWSTATE_EVENT_LOG_PATH") {
            if val.is_empty() {
                eprintln!("Warning: FLOWSTATE_EVENT_LOG_PATH is empty. Ignoring.");
            } else {
                self.event_log.path = Some(PathBuf::from(val));
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field. A value equal to
    /// the default cannot override a non-default value from a lower layer.
    fn merge(mut self, other: Config) -> Self {
        let default_model = ModelConfig::default();
        merge_f64(
            &mut self.model.game_skill_delta,
            other.model.game_skill_delta,
            default_model.game_skill_delta,
        );
        merge_f64(
            &mut self.model.default_skill_delta,
            other.model.default_skill_delta,
            default_model.default_skill_delta,
        );
        merge_f64(
            &mut self.model.challenge_rate,
            other.model.challenge_rate,
            default_model.challenge_rate,
        );
        merge_f64(
            &mut self.model.default_difficulty,
            other.model.default_difficulty,
            default_model.default_difficulty,
        );
        merge_f64(
            &mut self.model.anxiety_threshold,
            other.model.anxiety_threshold,
            default_model.anxiety_threshold,
        );
        merge_f64(
            &mut self.model.boredom_threshold,
            other.model.boredom_threshold,
            default_model.boredom_threshold,
        );

        if other.event_log.enabled.is_some() {
            self.event_log.enabled = other.event_log.enabled;
        }
        if other.event_log.path.is_some() {
            self.event_log.path = other.event_log.path;
        }

        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `.flowstate/config.toml` via a temp file and rename.
    pub fn save_project(&self, cwd: &Path) -> Result<()> {
        let dir = cwd.join(".flowstate");
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| FlowError::storage(&dir, e))?;
        }

        let config_path = dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| FlowError::config(e.to_string()))?;

        let temp_path = dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| FlowError::storage(&temp_path, e))?;
        fs::rename(&temp_path, &config_path).map_err(|e| FlowError::storage(&config_path, e))?;

        Ok(())
    }
}

fn merge_f64(target: &mut f64, other: f64, default: f64) {
    if other != default {
        *target = other;
    }
}

fn override_f64(var: &str, target: &mut f64, is_valid: fn(f64) -> bool) {
    let Ok(val) = env::var(var) else {
        return;
    };
    match val.parse::<f64>() {
        Ok(n) if is_valid(n) => *target = n,
        Ok(n) => eprintln!(
            "Warning: Invalid {} value '{}'. Out of range. Using '{}'.",
            var, n, target
        ),
        Err(_) => eprintln!(
            "Warning: Invalid {} value '{}'. Expected a decimal number. Using '{}'.",
            var, val, target
        ),
    }
}

/// Get the Flowstate home directory.
///
/// Checks `FLOWSTATE_HOME` first, then falls back to `~/.flowstate`.
/// An empty `FLOWSTATE_HOME` is ignored.
pub fn flowstate_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("FLOWSTATE_HOME") {
        if home.is_empty() {
            tracing::warn!("FLOWSTATE_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    dirs::home_dir().map(|home| home.join(".flowstate"))
}

/// Default event log path: `<flowstate_home>/events.jsonl`.
pub fn default_event_log_path() -> Option<PathBuf> {
    flowstate_home().map(|h| h.join("events.jsonl"))
}
