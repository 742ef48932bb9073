//! # Priomage Core Library
//!
//! This library computes a single numeric priority for tracked work items and
//! writes it back to a GitHub Projects V2 board. The `priomage` CLI is a thin
//! shell over the same core.
//!
//! ## Architecture
//!
//! - **Scoring**: Pure, deterministic engine combining goal weight, impact,
//!   effort and due-date urgency into a score in [0, 200] (lower is more urgent)
//! - **Planner**: Scores a batch, adapts scores to the destination field type
//!   and decides which values actually change
//! - **Storage**: TOML-based configuration
//! - **Integrations**: GitHub Projects V2 GraphQL client and the project item
//!   model that filters raw items into scoreable ones
//!
//! ## Key Components
//!
//! - [`PriorityEngine`]: Immutable scoring engine built from configuration
//! - [`plan`]: Batch planning with per-item failure isolation
//! - [`Config`]: Application configuration management
//! - [`ProjectsClient`]: GitHub Projects V2 client

pub mod error;
pub mod integrations;
pub mod item;
pub mod planner;
pub mod scoring;
pub mod storage;

pub use error::{
    ConfigError, CoreError, GitHubError, InvariantViolation, ItemError, ValidationError,
};
pub use integrations::{ProjectField, ProjectInfo, ProjectItem, ProjectsClient};
pub use item::{parse_due_date, ScoreableItem};
pub use planner::{plan, PlannedWrite, RunPlan, ScoringCandidate, WriteAction};
pub use scoring::{
    adapt, explain, DestinationField, EffortLevel, FieldValue, PriorityBand, PriorityEngine,
    PriorityScore, ScoreBreakdown,
};
pub use storage::Config;
