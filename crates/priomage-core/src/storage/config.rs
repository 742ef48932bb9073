//! TOML-based application configuration.
//!
//! Stores:
//! - GitHub project coordinates and retry policy
//! - Names of the project fields that hold impact, effort, due date and priority
//! - Scoring tables: goal weights, critical labels, urgency curve, impact range
//!
//! Configuration is stored at `~/.config/priomage/config.toml`.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::planner::DEFAULT_UPDATE_THRESHOLD;
use crate::scoring::goal::{DEFAULT_CRITICAL_LABELS, DEFAULT_GOAL_WEIGHT, DEFAULT_GOAL_WEIGHTS};
use crate::scoring::urgency::{DEFAULT_HALF_LIFE_DAYS, DEFAULT_MAX_BONUS};
use crate::scoring::{
    CriticalLabelSet, GoalWeightTable, ImpactRange, PriorityCalculator, PriorityEngine,
    UrgencyCurve,
};

pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

/// GitHub project coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub organization: String,
    pub project_number: u32,
    pub api_url: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project_number: 1,
            api_url: DEFAULT_API_URL.into(),
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// Names of the project fields the tool reads and writes.
/// Lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Candidate names for the destination field, first match wins.
    pub priority: Vec<String>,
    pub impact: String,
    pub effort: String,
    pub due: String,
    pub critical: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            priority: vec!["Priority".into(), "Prio".into()],
            impact: "Impact".into(),
            effort: "Effort".into(),
            due: "Due".into(),
            critical: "Critical".into(),
        }
    }
}

/// Urgency curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyConfig {
    pub max_bonus: f64,
    pub half_life_days: f64,
}

impl Default for UrgencyConfig {
    fn default() -> Self {
        Self {
            max_bonus: DEFAULT_MAX_BONUS,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

/// Scoring tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub default_goal_weight: f64,
    pub impact_min: f64,
    pub impact_max: f64,
    /// Minimum change in a numeric priority before it is rewritten.
    pub update_threshold: f64,
    pub critical_labels: Vec<String>,
    /// Goal label → weight, in declaration order.
    pub goal_weights: IndexMap<String, f64>,
    pub urgency: UrgencyConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_goal_weight: DEFAULT_GOAL_WEIGHT,
            impact_min: 1.0,
            impact_max: 100.0,
            update_threshold: DEFAULT_UPDATE_THRESHOLD,
            critical_labels: DEFAULT_CRITICAL_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect(),
            goal_weights: DEFAULT_GOAL_WEIGHTS
                .iter()
                .map(|(goal, weight)| (goal.to_string(), *weight))
                .collect(),
            urgency: UrgencyConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Validate the tables and build the immutable engine.
    ///
    /// # Errors
    ///
    /// Returns an error for weights outside [0, 1], a default weight above
    /// any goal weight, a malformed impact range or urgency curve, or a
    /// negative update threshold.
    pub fn build_engine(&self) -> Result<PriorityEngine, ConfigError> {
        if !self.update_threshold.is_finite() || self.update_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "scoring.update_threshold".into(),
                message: format!("{} must be a non-negative number", self.update_threshold),
            });
        }
        let goals = GoalWeightTable::new(
            self.goal_weights
                .iter()
                .map(|(goal, weight)| (goal.clone(), *weight)),
            self.default_goal_weight,
        )?;
        let critical = CriticalLabelSet::new(&self.critical_labels);
        let urgency = UrgencyCurve::new(self.urgency.max_bonus, self.urgency.half_life_days)?;
        let calculator = PriorityCalculator::new(ImpactRange::new(self.impact_min, self.impact_max)?);
        PriorityEngine::new(goals, critical, urgency, calculator)
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/priomage/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub fields: FieldNames,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::MissingKey("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("cannot parse '{value}' as bool: {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)
                            .map_err(|e| invalid(format!("expected JSON: {e}")))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/priomage"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Overlay `GITHUB_ORG` and `GITHUB_PROJECT_NUMBER` from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `GITHUB_PROJECT_NUMBER` is set but not a number.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(org) = std::env::var("GITHUB_ORG") {
            if !org.trim().is_empty() {
                self.github.organization = org.trim().to_string();
            }
        }
        if let Ok(number) = std::env::var("GITHUB_PROJECT_NUMBER") {
            self.github.project_number =
                number
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "GITHUB_PROJECT_NUMBER".into(),
                        message: format!("'{number}' is not a project number"),
                    })?;
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn goal_weight_order_survives_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        let goals: Vec<&String> = parsed.scoring.goal_weights.keys().collect();
        assert_eq!(goals[0], "customer acquisition");
        assert_eq!(goals[goals.len() - 1], "operations");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [github]
            organization = "acme"

            [scoring]
            update_threshold = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.github.organization, "acme");
        assert_eq!(cfg.github.project_number, 1);
        assert_eq!(cfg.scoring.update_threshold, 5.0);
        assert_eq!(cfg.scoring.default_goal_weight, 0.5);
        assert_eq!(cfg.fields.priority, vec!["Priority", "Prio"]);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("github.project_number").as_deref(), Some("1"));
        assert_eq!(cfg.get("fields.impact").as_deref(), Some("Impact"));
        assert_eq!(cfg.get("scoring.goal_weights.revenue").as_deref(), Some("1.0"));
        assert!(cfg.get("scoring.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("github.organization", "acme").unwrap();
        cfg.set("scoring.urgency.half_life_days", "7.5").unwrap();
        cfg.set("scoring.goal_weights.operations", "0.65").unwrap();
        cfg.set("fields.priority", r#"["Rank"]"#).unwrap();
        assert_eq!(cfg.github.organization, "acme");
        assert_eq!(cfg.scoring.urgency.half_life_days, 7.5);
        assert_eq!(cfg.scoring.goal_weights["operations"], 0.65);
        assert_eq!(cfg.fields.priority, vec!["Rank"]);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("github.nonexistent", "x").is_err());
        assert!(cfg.set("github.project_number", "seven").is_err());
        assert!(cfg.set("", "x").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn default_scoring_builds_engine() {
        let engine = ScoringConfig::default().build_engine().unwrap();
        assert_eq!(engine.goals().default_weight(), 0.5);
        assert!(engine.critical_labels().contains("security"));
        assert_eq!(engine.urgency_curve().max_bonus(), 90.0);
    }

    #[test]
    fn build_engine_rejects_invalid_tables() {
        let mut scoring = ScoringConfig::default();
        scoring.goal_weights.insert("moonshot".into(), 1.4);
        assert!(scoring.build_engine().is_err());

        let mut scoring = ScoringConfig::default();
        scoring.default_goal_weight = 0.95;
        assert!(scoring.build_engine().is_err());

        let mut scoring = ScoringConfig::default();
        scoring.impact_min = 50.0;
        scoring.impact_max = 10.0;
        assert!(scoring.build_engine().is_err());

        let mut scoring = ScoringConfig::default();
        scoring.update_threshold = -1.0;
        assert!(scoring.build_engine().is_err());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("github.organization", "acme").unwrap();
        cfg.set("scoring.update_threshold", "3").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.github.organization, "acme");
        assert_eq!(loaded.scoring.update_threshold, 3.0);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[github\norganization = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { .. }));
    }
}
