//! Label tables: goal weights and critical labels.
//!
//! Both tables are built once from configuration and are immutable afterwards.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ConfigError;

/// Default weight for items without a recognized goal label.
pub const DEFAULT_GOAL_WEIGHT: f64 = 0.5;

/// Built-in goal weights, grouped by strategic focus.
pub const DEFAULT_GOAL_WEIGHTS: &[(&str, f64)] = &[
    // Customer
    ("customer acquisition", 1.0),
    ("customer retention", 0.9),
    ("user experience", 0.8),
    ("product market fit", 1.0),
    // Technical
    ("technical debt", 0.7),
    ("performance", 0.8),
    ("security", 1.0),
    ("scalability", 0.7),
    ("infrastructure", 0.6),
    // Business
    ("revenue", 1.0),
    ("cost reduction", 0.8),
    ("compliance", 0.9),
    ("operations", 0.6),
];

/// Labels that force the best possible score.
pub const DEFAULT_CRITICAL_LABELS: &[&str] = &[
    "critical",
    "severity:critical",
    "security",
    "hotfix",
    "urgent",
    "p0",
    "p1",
    "p2",
];

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalWeight {
    pub goal: String,
    pub weight: f64,
    #[serde(skip)]
    key: String,
}

/// Result of resolving a label set against the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalMatch {
    pub weight: f64,
    /// Goal that supplied the weight; `None` means the default was used.
    pub goal: Option<String>,
}

/// Ordered label-name → weight table with an implicit default.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalWeightTable {
    entries: Vec<GoalWeight>,
    default_weight: f64,
}

impl GoalWeightTable {
    /// Build a table, checking that every weight lies in [0, 1] and that the
    /// default is no greater than any listed weight.
    pub fn new<I, S>(entries: I, default_weight: f64) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        check_unit("scoring.default_goal_weight", default_weight)?;

        let mut table = Vec::new();
        for (goal, weight) in entries {
            let goal = goal.into();
            let key = normalize_label(&goal);
            let config_key = format!("scoring.goal_weights.{goal}");
            if key.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: config_key,
                    message: "goal name is empty".into(),
                });
            }
            check_unit(&config_key, weight)?;
            if weight < default_weight {
                return Err(ConfigError::InvalidValue {
                    key: config_key,
                    message: format!(
                        "weight {weight} is below the default weight {default_weight}"
                    ),
                });
            }
            table.push(GoalWeight { goal, weight, key });
        }

        Ok(Self {
            entries: table,
            default_weight,
        })
    }

    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    pub fn entries(&self) -> &[GoalWeight] {
        &self.entries
    }

    /// Weight for a label set: the maximum over matching goals, or the default.
    pub fn resolve<S: AsRef<str>>(&self, labels: &[S]) -> f64 {
        self.resolve_match(labels).weight
    }

    /// Like [`resolve`](Self::resolve), also naming the goal that won.
    pub fn resolve_match<S: AsRef<str>>(&self, labels: &[S]) -> GoalMatch {
        let mut best = GoalMatch {
            weight: self.default_weight,
            goal: None,
        };

        for label in labels {
            let normalized = normalize_label(label.as_ref());
            for entry in &self.entries {
                // Once a goal has matched, only a strictly heavier one replaces it.
                let better = match best.goal {
                    None => entry.weight >= best.weight,
                    Some(_) => entry.weight > best.weight,
                };
                if better && normalized.contains(&entry.key) {
                    best = GoalMatch {
                        weight: entry.weight,
                        goal: Some(entry.goal.clone()),
                    };
                }
            }
        }

        best
    }
}

impl Default for GoalWeightTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_GOAL_WEIGHTS
                .iter()
                .map(|(goal, weight)| GoalWeight {
                    goal: (*goal).to_string(),
                    weight: *weight,
                    key: normalize_label(goal),
                })
                .collect(),
            default_weight: DEFAULT_GOAL_WEIGHT,
        }
    }
}

fn check_unit(key: &str, weight: f64) -> Result<(), ConfigError> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("weight {weight} must be within [0, 1]"),
        })
    }
}

/// Case-insensitive set of labels that trigger the critical override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalLabelSet {
    labels: BTreeSet<String>,
}

impl CriticalLabelSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.as_ref().trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label.trim().to_lowercase())
    }

    /// First label in `labels` that is critical.
    pub fn find<'a, S: AsRef<str>>(&self, labels: &'a [S]) -> Option<&'a str> {
        labels
            .iter()
            .map(AsRef::as_ref)
            .find(|label| self.contains(label))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for CriticalLabelSet {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_LABELS)
    }
}
