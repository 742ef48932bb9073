//! Priority score calculation.
//!
//! Scores live in [0, 200] and LOWER means MORE urgent:
//!
//! ```text
//! base     = 200 - weight * impact
//! adjusted = base + (weight * impact) * effort_factor
//! score    = clamp(adjusted - urgency_bonus, 0, 200)
//! ```
//!
//! A critical label short-circuits everything and yields exactly 0.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::effort::{normalize, EffortLevel};
use super::goal::{CriticalLabelSet, GoalWeightTable};
use super::urgency::{days_until, UrgencyCurve};
use crate::error::{ConfigError, CoreError, InvariantViolation, Result, ValidationError};
use crate::item::ScoreableItem;

pub const SCORE_FLOOR: f64 = 0.0;
pub const SCORE_CEILING: f64 = 200.0;

/// A priority score, guaranteed to lie in [0, 200].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PriorityScore(f64);

impl PriorityScore {
    /// The critical-override result.
    pub const CRITICAL: PriorityScore = PriorityScore(SCORE_FLOOR);

    pub fn new(value: f64) -> std::result::Result<Self, InvariantViolation> {
        if (SCORE_FLOOR..=SCORE_CEILING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvariantViolation { value })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for PriorityScore {
    type Error = InvariantViolation;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriorityScore> for f64 {
    fn from(score: PriorityScore) -> Self {
        score.0
    }
}

impl fmt::Display for PriorityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive range accepted for the impact input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRange {
    pub min: f64,
    pub max: f64,
}

impl ImpactRange {
    pub fn new(min: f64, max: f64) -> std::result::Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max || max > SCORE_CEILING {
            return Err(ConfigError::InvalidValue {
                key: "scoring.impact_min/impact_max".into(),
                message: format!("[{min}, {max}] must be a finite range within [0, 200]"),
            });
        }
        Ok(Self { min, max })
    }

    pub fn validate(&self, impact: f64) -> std::result::Result<f64, ValidationError> {
        if impact.is_finite() && (self.min..=self.max).contains(&impact) {
            Ok(impact)
        } else {
            Err(ValidationError::ImpactOutOfRange {
                value: impact,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for ImpactRange {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 100.0,
        }
    }
}

/// Intermediate terms of a non-critical score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTerms {
    pub goal_weight: f64,
    /// Goal label that supplied the weight, if any.
    pub goal: Option<String>,
    pub impact: f64,
    pub effort: EffortLevel,
    pub effort_factor: f64,
    pub days_until_due: i64,
    pub urgency_bonus: f64,
    /// `200 - weight * impact`
    pub base: f64,
    /// Base after the effort adjustment.
    pub effort_adjusted: f64,
    /// Value before the final clamp.
    pub unclamped: f64,
}

/// How a score was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreDetail {
    CriticalOverride { label: String },
    Computed(ScoreTerms),
}

/// A score plus everything needed to explain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub identifier: String,
    pub score: PriorityScore,
    pub detail: ScoreDetail,
}

impl ScoreBreakdown {
    pub fn is_critical(&self) -> bool {
        matches!(self.detail, ScoreDetail::CriticalOverride { .. })
    }
}

/// The pure arithmetic step, given already-resolved terms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorityCalculator {
    impact_range: ImpactRange,
}

impl PriorityCalculator {
    pub fn new(impact_range: ImpactRange) -> Self {
        Self { impact_range }
    }

    pub fn impact_range(&self) -> ImpactRange {
        self.impact_range
    }

    /// Combine resolved terms into a final score.
    ///
    /// # Errors
    ///
    /// Returns a validation error when impact, weight, effort factor or urgency
    /// bonus is outside its domain, and an invariant violation if the clamped
    /// result still escapes [0, 200].
    pub fn compute(
        &self,
        item: &ScoreableItem,
        weight: f64,
        effort_factor: f64,
        urgency_bonus: f64,
        is_critical: bool,
    ) -> Result<PriorityScore> {
        if is_critical {
            return Ok(PriorityScore::CRITICAL);
        }
        let terms = self.terms(item.impact, weight, effort_factor, urgency_bonus)?;
        Ok(clamp_score(terms.unclamped)?)
    }

    fn terms(
        &self,
        impact: f64,
        weight: f64,
        effort_factor: f64,
        urgency_bonus: f64,
    ) -> std::result::Result<Terms, ValidationError> {
        let impact = self.impact_range.validate(impact)?;
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(ValidationError::WeightOutOfRange { value: weight });
        }
        if !effort_factor.is_finite() || !(0.0..1.0).contains(&effort_factor) {
            return Err(ValidationError::EffortFactorOutOfRange {
                value: effort_factor,
            });
        }
        if !urgency_bonus.is_finite() || urgency_bonus < 0.0 {
            return Err(ValidationError::UrgencyOutOfRange {
                value: urgency_bonus,
            });
        }

        let reduction = weight * impact;
        let base = SCORE_CEILING - reduction;
        let effort_adjusted = (base + reduction * effort_factor).clamp(SCORE_FLOOR, SCORE_CEILING);
        let unclamped = effort_adjusted - urgency_bonus;

        Ok(Terms {
            base,
            effort_adjusted,
            unclamped,
        })
    }
}

struct Terms {
    base: f64,
    effort_adjusted: f64,
    unclamped: f64,
}

fn clamp_score(raw: f64) -> std::result::Result<PriorityScore, InvariantViolation> {
    // NaN survives clamp and is rejected here.
    PriorityScore::new(raw.clamp(SCORE_FLOOR, SCORE_CEILING))
}

/// Immutable scoring engine: label tables, urgency curve and calculator.
#[derive(Debug, Clone, Default)]
pub struct PriorityEngine {
    goals: GoalWeightTable,
    critical: CriticalLabelSet,
    urgency: UrgencyCurve,
    calculator: PriorityCalculator,
}

impl PriorityEngine {
    /// Assemble an engine.
    ///
    /// # Errors
    ///
    /// The maximum urgency bonus must stay below the smallest possible
    /// effort-adjusted base (`200 - impact_max`), otherwise a non-critical
    /// item could reach 0 and be mistaken for a critical one.
    pub fn new(
        goals: GoalWeightTable,
        critical: CriticalLabelSet,
        urgency: UrgencyCurve,
        calculator: PriorityCalculator,
    ) -> std::result::Result<Self, ConfigError> {
        let min_base = SCORE_CEILING - calculator.impact_range().max;
        if urgency.max_bonus() >= min_base {
            return Err(ConfigError::InvalidValue {
                key: "scoring.urgency.max_bonus".into(),
                message: format!(
                    "{} must be below {min_base} (200 - impact_max)",
                    urgency.max_bonus()
                ),
            });
        }
        Ok(Self {
            goals,
            critical,
            urgency,
            calculator,
        })
    }

    pub fn goals(&self) -> &GoalWeightTable {
        &self.goals
    }

    pub fn critical_labels(&self) -> &CriticalLabelSet {
        &self.critical
    }

    pub fn urgency_curve(&self) -> &UrgencyCurve {
        &self.urgency
    }

    pub fn calculator(&self) -> &PriorityCalculator {
        &self.calculator
    }

    /// Critical label (or severity value) carried by the item, if any.
    pub fn critical_marker<'a>(&self, item: &'a ScoreableItem) -> Option<&'a str> {
        self.critical.find(&item.labels).or_else(|| {
            item.severity
                .as_deref()
                .filter(|severity| self.critical.contains(severity))
        })
    }

    /// Score one item as of `today`.
    pub fn score(&self, item: &ScoreableItem, today: NaiveDate) -> Result<ScoreBreakdown> {
        if let Some(label) = self.critical_marker(item) {
            debug!(item = %item.identifier, label, "critical override");
            return Ok(ScoreBreakdown {
                identifier: item.identifier.clone(),
                score: PriorityScore::CRITICAL,
                detail: ScoreDetail::CriticalOverride {
                    label: label.to_string(),
                },
            });
        }

        let goal = self.goals.resolve_match(&item.labels);
        let effort_factor = normalize(item.effort);
        let days = days_until(item.due, today);
        let urgency_bonus = self.urgency.bonus_for_days(days);

        let terms = self
            .calculator
            .terms(item.impact, goal.weight, effort_factor, urgency_bonus)?;
        let score = clamp_score(terms.unclamped).map_err(CoreError::from)?;

        debug!(
            item = %item.identifier,
            weight = goal.weight,
            effort_factor,
            urgency_bonus,
            score = score.value(),
            "scored"
        );

        Ok(ScoreBreakdown {
            identifier: item.identifier.clone(),
            score,
            detail: ScoreDetail::Computed(ScoreTerms {
                goal_weight: goal.weight,
                goal: goal.goal,
                impact: item.impact,
                effort: item.effort,
                effort_factor,
                days_until_due: days,
                urgency_bonus,
                base: terms.base,
                effort_adjusted: terms.effort_adjusted,
                unclamped: terms.unclamped,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn item(labels: &[&str], impact: f64, effort: EffortLevel, due_in_days: i64) -> ScoreableItem {
        ScoreableItem::new("acme/api#7", impact, effort, today() + Duration::days(due_in_days))
            .with_labels(labels.iter().copied())
    }

    #[test]
    fn critical_label_scores_zero() {
        let engine = PriorityEngine::default();
        let breakdown = engine
            .score(&item(&["security"], 50.0, EffortLevel::Large, 1), today())
            .unwrap();
        assert_eq!(breakdown.score.value(), 0.0);
        assert!(breakdown.is_critical());
    }

    #[test]
    fn critical_override_skips_validation() {
        let engine = PriorityEngine::default();
        let breakdown = engine
            .score(&item(&["P0"], 9_999.0, EffortLevel::ExtraLarge, 400), today())
            .unwrap();
        assert_eq!(breakdown.score, PriorityScore::CRITICAL);
    }

    #[test]
    fn critical_severity_field_scores_zero() {
        let engine = PriorityEngine::default();
        let critical = item(&[], 10.0, EffortLevel::Medium, 30).with_severity("Critical");
        assert!(engine.score(&critical, today()).unwrap().is_critical());

        let minor = item(&[], 10.0, EffortLevel::Medium, 30).with_severity("minor");
        assert!(!engine.score(&minor, today()).unwrap().is_critical());
    }

    #[test]
    fn default_weight_far_future_lands_near_150() {
        let engine = PriorityEngine::default();
        let breakdown = engine
            .score(&item(&[], 100.0, EffortLevel::ExtraSmall, 365), today())
            .unwrap();
        let score = breakdown.score.value();
        assert!((149.9..=150.0).contains(&score), "got {score}");
    }

    #[test]
    fn revenue_due_today_is_critical_band_value() {
        let engine = PriorityEngine::default();
        let breakdown = engine
            .score(&item(&["revenue"], 100.0, EffortLevel::ExtraSmall, 0), today())
            .unwrap();
        // 200 - 100 - 90
        assert!((breakdown.score.value() - 10.0).abs() < 1e-9);
        assert!(!breakdown.is_critical());
    }

    #[test]
    fn table_of_known_scores() {
        let engine = PriorityEngine::default();
        let cases: &[(&[&str], f64, EffortLevel, i64, f64)] = &[
            // labels, impact, effort, due in days, expected
            (&["revenue"], 100.0, EffortLevel::ExtraSmall, 0, 10.0),
            (&["revenue"], 100.0, EffortLevel::ExtraSmall, -30, 10.0),
            (&["revenue"], 100.0, EffortLevel::ExtraSmall, 14, 55.0),
            (&["revenue"], 100.0, EffortLevel::Large, 14, 95.0),
            (&[], 100.0, EffortLevel::Medium, 0, 72.5),
            (&["performance"], 50.0, EffortLevel::Small, 28, 141.5),
        ];
        for (labels, impact, effort, days, expected) in cases {
            let score = engine
                .score(&item(labels, *impact, *effort, *days), today())
                .unwrap()
                .score
                .value();
            assert!(
                (score - expected).abs() < 1e-9,
                "{labels:?} {impact} {effort} {days}: expected {expected}, got {score}"
            );
        }
    }

    #[test]
    fn higher_effort_raises_score() {
        let engine = PriorityEngine::default();
        let scores: Vec<f64> = EffortLevel::ALL
            .iter()
            .map(|effort| {
                engine
                    .score(&item(&["revenue"], 80.0, *effort, 30), today())
                    .unwrap()
                    .score
                    .value()
            })
            .collect();
        for pair in scores.windows(2) {
            assert!(pair[0] <= pair[1], "{scores:?}");
        }
    }

    #[test]
    fn impact_out_of_range_is_rejected() {
        let engine = PriorityEngine::default();
        let err = engine
            .score(&item(&[], 0.0, EffortLevel::Small, 5), today())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ImpactOutOfRange { .. })
        ));
        assert!(engine
            .score(&item(&[], f64::NAN, EffortLevel::Small, 5), today())
            .is_err());
    }

    #[test]
    fn compute_validates_terms() {
        let calculator = PriorityCalculator::default();
        let it = item(&[], 50.0, EffortLevel::Small, 5);
        assert!(calculator.compute(&it, 1.2, 0.1, 0.0, false).is_err());
        assert!(calculator.compute(&it, 0.5, 1.0, 0.0, false).is_err());
        assert!(calculator.compute(&it, 0.5, 0.1, -1.0, false).is_err());
        let score = calculator.compute(&it, 0.5, 0.0, 0.0, false).unwrap();
        assert_eq!(score.value(), 175.0);
    }

    #[test]
    fn compute_clamps_output_not_input() {
        let calculator = PriorityCalculator::default();
        let it = item(&[], 100.0, EffortLevel::ExtraSmall, 0);
        let score = calculator.compute(&it, 1.0, 0.0, 500.0, false).unwrap();
        assert_eq!(score.value(), 0.0);
    }

    #[test]
    fn compute_critical_ignores_terms() {
        let calculator = PriorityCalculator::default();
        let it = item(&[], -5.0, EffortLevel::ExtraSmall, 0);
        let score = calculator.compute(&it, 7.0, 3.0, -1.0, true).unwrap();
        assert_eq!(score, PriorityScore::CRITICAL);
    }

    #[test]
    fn engine_rejects_urgency_that_could_reach_zero() {
        let err = PriorityEngine::new(
            GoalWeightTable::default(),
            CriticalLabelSet::default(),
            UrgencyCurve::new(100.0, 14.0).unwrap(),
            PriorityCalculator::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_bonus"));
    }

    #[test]
    fn priority_score_rejects_out_of_range() {
        assert!(PriorityScore::new(200.0).is_ok());
        assert!(PriorityScore::new(200.01).is_err());
        assert!(PriorityScore::new(-0.1).is_err());
        assert!(PriorityScore::new(f64::NAN).is_err());
    }
}
