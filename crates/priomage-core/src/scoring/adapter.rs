//! Adapting scores to the destination field's storage type.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::priority::{PriorityScore, ScoreBreakdown, ScoreDetail};
use crate::error::ConfigError;

/// Named partition of the score space used for single-select fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityBand {
    Critical,
    High,
    Medium,
    Low,
    Backlog,
}

impl PriorityBand {
    pub const ALL: [PriorityBand; 5] = [
        PriorityBand::Critical,
        PriorityBand::High,
        PriorityBand::Medium,
        PriorityBand::Low,
        PriorityBand::Backlog,
    ];

    /// Band for a score:
    ///
    /// | Band     | Range      |
    /// |----------|------------|
    /// | Critical | [0, 20]    |
    /// | High     | (20, 50]   |
    /// | Medium   | (50, 100]  |
    /// | Low      | (100, 160] |
    /// | Backlog  | (160, 200] |
    pub fn for_score(score: PriorityScore) -> Self {
        match score.value() {
            s if s <= 20.0 => PriorityBand::Critical,
            s if s <= 50.0 => PriorityBand::High,
            s if s <= 100.0 => PriorityBand::Medium,
            s if s <= 160.0 => PriorityBand::Low,
            _ => PriorityBand::Backlog,
        }
    }

    /// Upper bound (inclusive) of the band.
    pub fn upper_bound(self) -> f64 {
        match self {
            PriorityBand::Critical => 20.0,
            PriorityBand::High => 50.0,
            PriorityBand::Medium => 100.0,
            PriorityBand::Low => 160.0,
            PriorityBand::Backlog => 200.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PriorityBand::Critical => "Critical",
            PriorityBand::High => "High",
            PriorityBand::Medium => "Medium",
            PriorityBand::Low => "Low",
            PriorityBand::Backlog => "Backlog",
        }
    }
}

impl fmt::Display for PriorityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One option of a single-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
}

impl SelectOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Storage representation of the field that receives the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestinationField {
    Number,
    Text,
    SingleSelect { options: Vec<SelectOption> },
}

impl DestinationField {
    /// Check that the field can represent every score.
    ///
    /// # Errors
    ///
    /// A single-select field must offer an option for each of the five bands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let DestinationField::SingleSelect { options } = self else {
            return Ok(());
        };
        let missing: Vec<String> = PriorityBand::ALL
            .iter()
            .filter(|band| !options.iter().any(|opt| opt.matches(band.name())))
            .map(|band| band.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingBandOptions { missing })
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DestinationField::Number => "NUMBER",
            DestinationField::Text => "TEXT",
            DestinationField::SingleSelect { .. } => "SINGLE_SELECT",
        }
    }
}

/// Concrete value to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    Number { number: f64 },
    Text { text: String },
    SingleSelect { option_id: String, name: String },
}

impl FieldValue {
    /// Numeric reading of the value, when it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number { number } => Some(*number),
            FieldValue::Text { text } => text.trim().parse().ok(),
            FieldValue::SingleSelect { .. } => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number { number } => write!(f, "{number:.2}"),
            FieldValue::Text { text } => f.write_str(text),
            FieldValue::SingleSelect { name, .. } => f.write_str(name),
        }
    }
}

/// Value to write for `score` into `field`.
///
/// # Errors
///
/// Fails with [`ConfigError::MissingBandOptions`] when a single-select field
/// cannot represent every band.
pub fn adapt(score: PriorityScore, field: &DestinationField) -> Result<FieldValue, ConfigError> {
    match field {
        DestinationField::Number => Ok(FieldValue::Number {
            number: score.value(),
        }),
        DestinationField::Text => Ok(FieldValue::Text {
            text: score.value().to_string(),
        }),
        DestinationField::SingleSelect { options } => {
            field.validate()?;
            let band = PriorityBand::for_score(score);
            let option = options
                .iter()
                .find(|opt| opt.matches(band.name()))
                .ok_or_else(|| ConfigError::MissingBandOptions {
                    missing: vec![band.name().to_string()],
                })?;
            Ok(FieldValue::SingleSelect {
                option_id: option.id.clone(),
                name: option.name.clone(),
            })
        }
    }
}

/// One line of an explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainFactor {
    pub name: &'static str,
    pub value: String,
}

impl ExplainFactor {
    fn new(name: &'static str, value: impl fmt::Display) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }
}

/// Human-readable account of a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub identifier: String,
    pub score: f64,
    pub band: PriorityBand,
    pub critical_override: bool,
    pub summary: String,
    pub factors: Vec<ExplainFactor>,
}

/// Project a breakdown into an explanation. No term is recomputed.
pub fn explain(breakdown: &ScoreBreakdown) -> Explanation {
    let band = PriorityBand::for_score(breakdown.score);
    let score = breakdown.score.value();

    let (critical_override, summary, factors) = match &breakdown.detail {
        ScoreDetail::CriticalOverride { label } => (
            true,
            format!("Critical override via '{label}': minimum score, maximum priority"),
            vec![ExplainFactor::new("critical label", label)],
        ),
        ScoreDetail::Computed(terms) => {
            let goal = terms.goal.as_deref().unwrap_or("(default)");
            let due = match terms.days_until_due {
                d if d < 0 => format!("overdue by {} days", -d),
                0 => "due today".to_string(),
                d => format!("due in {d} days"),
            };
            (
                false,
                format!(
                    "{score:.2} = {:.2} base + {:.2} effort - {:.2} urgency ({due})",
                    terms.base,
                    terms.effort_adjusted - terms.base,
                    terms.urgency_bonus,
                ),
                vec![
                    ExplainFactor::new("goal", goal),
                    ExplainFactor::new("goal weight", format!("{:.2}", terms.goal_weight)),
                    ExplainFactor::new("impact", format!("{:.2}", terms.impact)),
                    ExplainFactor::new("effort", terms.effort),
                    ExplainFactor::new("effort factor", format!("{:.2}", terms.effort_factor)),
                    ExplainFactor::new("base score", format!("{:.2}", terms.base)),
                    ExplainFactor::new(
                        "effort-adjusted score",
                        format!("{:.2}", terms.effort_adjusted),
                    ),
                    ExplainFactor::new("days until due", terms.days_until_due),
                    ExplainFactor::new("urgency bonus", format!("{:.2}", terms.urgency_bonus)),
                    ExplainFactor::new("before clamp", format!("{:.2}", terms.unclamped)),
                ],
            )
        }
    };

    Explanation {
        identifier: breakdown.identifier.clone(),
        score,
        band,
        critical_override,
        summary,
        factors,
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {:.2} ({})", self.identifier, self.score, self.band)?;
        writeln!(f, "  {}", self.summary)?;
        for factor in &self.factors {
            writeln!(f, "  {:<22} {}", factor.name, factor.value)?;
        }
        Ok(())
    }
}
