//! Priority scoring engine.
//!
//! Leaf-first: [`goal`] resolves label weights and critical labels, [`effort`]
//! normalizes effort levels, [`urgency`] turns due dates into a bonus,
//! [`priority`] combines them into a [`PriorityScore`], and [`adapter`] turns
//! the score into the value a destination field stores.
//!
//! Every function here is pure. "Today" is always passed in by the caller.

pub mod adapter;
pub mod effort;
pub mod goal;
pub mod priority;
pub mod urgency;

pub use adapter::{
    adapt, explain, DestinationField, ExplainFactor, Explanation, FieldValue, PriorityBand,
    SelectOption,
};
pub use effort::{normalize, EffortLevel};
pub use goal::{CriticalLabelSet, GoalMatch, GoalWeightTable};
pub use priority::{
    ImpactRange, PriorityCalculator, PriorityEngine, PriorityScore, ScoreBreakdown, ScoreDetail,
    ScoreTerms,
};
pub use urgency::{days_until, UrgencyCurve};
