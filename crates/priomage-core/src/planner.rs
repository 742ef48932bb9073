//! Batch planning: score every candidate and decide which values to write.
//!
//! The destination field is validated before any item is scored, so a
//! misconfigured field aborts the run with nothing written. Items fail
//! independently of each other.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ConfigError, ItemError};
use crate::item::ScoreableItem;
use crate::scoring::{adapt, DestinationField, FieldValue, PriorityEngine, ScoreBreakdown};

/// Minimum numeric change that warrants a write.
pub const DEFAULT_UPDATE_THRESHOLD: f64 = 2.0;

/// An item ready for scoring together with its write handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringCandidate {
    pub item: ScoreableItem,
    /// Opaque handle the writer uses to address the item.
    pub target: String,
    /// Value currently stored in the destination field.
    pub current: Option<FieldValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    Update,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedWrite {
    pub target: String,
    pub breakdown: ScoreBreakdown,
    pub value: FieldValue,
    pub current: Option<FieldValue>,
    pub action: WriteAction,
}

#[derive(Debug, Default)]
pub struct RunPlan {
    pub writes: Vec<PlannedWrite>,
    pub failures: Vec<ItemError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub scored: usize,
    pub to_update: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl RunPlan {
    pub fn updates(&self) -> impl Iterator<Item = &PlannedWrite> {
        self.writes
            .iter()
            .filter(|w| w.action == WriteAction::Update)
    }

    pub fn summary(&self) -> PlanSummary {
        let to_update = self.updates().count();
        PlanSummary {
            scored: self.writes.len(),
            to_update,
            unchanged: self.writes.len() - to_update,
            failed: self.failures.len(),
        }
    }
}

/// Whether `new` differs enough from `current` to be written.
///
/// TEXT values are parsed and compared numerically, so the threshold applies to them too.
pub fn needs_update(current: Option<&FieldValue>, new: &FieldValue, threshold: f64) -> bool {
    let Some(current) = current else {
        return true;
    };
    match (current, new) {
        (FieldValue::SingleSelect { name: old, .. }, FieldValue::SingleSelect { name, .. }) => {
            !old.trim().eq_ignore_ascii_case(name.trim())
        }
        _ => match (current.as_number(), new.as_number()) {
            (Some(old), Some(value)) => (old - value).abs() > threshold,
            _ => true,
        },
    }
}

/// Score and adapt every candidate.
///
/// # Errors
///
/// Returns the destination's configuration error before any scoring happens.
pub fn plan(
    engine: &PriorityEngine,
    destination: &DestinationField,
    candidates: &[ScoringCandidate],
    today: NaiveDate,
    threshold: f64,
) -> Result<RunPlan, ConfigError> {
    destination.validate()?;

    let mut run = RunPlan::default();
    for candidate in candidates {
        let identifier = &candidate.item.identifier;
        let breakdown = match engine.score(&candidate.item, today) {
            Ok(breakdown) => breakdown,
            Err(err) => {
                let failure = ItemError::new(identifier.clone(), err);
                warn!(item = %identifier, field = failure.field(), "skipping item: {}", failure.source);
                run.failures.push(failure);
                continue;
            }
        };
        let value = adapt(breakdown.score, destination)?;
        let action = if needs_update(candidate.current.as_ref(), &value, threshold) {
            WriteAction::Update
        } else {
            WriteAction::Unchanged
        };
        run.writes.push(PlannedWrite {
            target: candidate.target.clone(),
            breakdown,
            value,
            current: candidate.current.clone(),
            action,
        });
    }

    let summary = run.summary();
    info!(
        scored = summary.scored,
        to_update = summary.to_update,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "planned priority updates"
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{EffortLevel, SelectOption};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn candidate(id: &str, impact: f64, current: Option<FieldValue>) -> ScoringCandidate {
        ScoringCandidate {
            item: ScoreableItem::new(id, impact, EffortLevel::ExtraSmall, today())
                .with_labels(["revenue"]),
            target: format!("PVTI_{id}"),
            current,
        }
    }

    #[test]
    fn text_values_compare_numerically() {
        let new = FieldValue::Text { text: "50".into() };
        assert!(!needs_update(Some(&FieldValue::Text { text: " 49 ".into() }), &new, 2.0));
        assert!(needs_update(Some(&FieldValue::Text { text: "47".into() }), &new, 2.0));
        assert!(needs_update(Some(&FieldValue::Text { text: "".into() }), &new, 2.0));
    }

    #[test]
    fn threshold_controls_numeric_updates() {
        let new = FieldValue::Number { number: 50.0 };
        assert!(needs_update(None, &new, 2.0));
        assert!(!needs_update(Some(&FieldValue::Number { number: 51.5 }), &new, 2.0));
        assert!(needs_update(Some(&FieldValue::Number { number: 52.5 }), &new, 2.0));
        assert!(!needs_update(
            Some(&FieldValue::Text { text: "49".into() }),
            &new,
            2.0
        ));
        assert!(needs_update(
            Some(&FieldValue::Text { text: "n/a".into() }),
            &new,
            2.0
        ));
    }

    #[test]
    fn single_select_compares_names() {
        let new = FieldValue::SingleSelect {
            option_id: "x".into(),
            name: "High".into(),
        };
        let same = FieldValue::SingleSelect {
            option_id: "x".into(),
            name: "high".into(),
        };
        let other = FieldValue::SingleSelect {
            option_id: "y".into(),
            name: "Low".into(),
        };
        assert!(!needs_update(Some(&same), &new, 2.0));
        assert!(needs_update(Some(&other), &new, 2.0));
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let engine = PriorityEngine::default();
        let candidates = vec![
            candidate("a", 100.0, None),
            candidate("bad", 1_000.0, None),
            candidate("c", 100.0, Some(FieldValue::Number { number: 10.5 })),
        ];
        let run = plan(
            &engine,
            &DestinationField::Number,
            &candidates,
            today(),
            DEFAULT_UPDATE_THRESHOLD,
        )
        .unwrap();

        assert_eq!(run.writes.len(), 2);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].identifier, "bad");
        assert_eq!(run.failures[0].field(), Some("impact"));

        let summary = run.summary();
        assert_eq!(summary.to_update, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(run.updates().next().unwrap().target, "PVTI_a");
    }

    #[test]
    fn misconfigured_select_aborts_before_scoring() {
        let engine = PriorityEngine::default();
        let destination = DestinationField::SingleSelect {
            options: vec![
                SelectOption::new("1", "Critical"),
                SelectOption::new("2", "High"),
                SelectOption::new("3", "Medium"),
                SelectOption::new("4", "Low"),
            ],
        };
        let err = plan(
            &engine,
            &destination,
            &[candidate("a", 100.0, None), candidate("bad", -3.0, None)],
            today(),
            DEFAULT_UPDATE_THRESHOLD,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBandOptions { .. }));
    }

    #[test]
    fn empty_batch_plans_nothing() {
        let engine = PriorityEngine::default();
        let run = plan(&engine, &DestinationField::Text, &[], today(), 2.0).unwrap();
        assert_eq!(
            run.summary(),
            PlanSummary {
                scored: 0,
                to_update: 0,
                unchanged: 0,
                failed: 0
            }
        );
    }
}
