//! The scoreable view of a tracked item.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scoring::EffortLevel;

/// An item with every input the scoring engine needs.
///
/// Instances are built by the fetch layer only for items that carry impact,
/// effort and a due date; the engine never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreableItem {
    /// Opaque reference used in reports (e.g. `acme/api#42`).
    pub identifier: String,
    pub labels: Vec<String>,
    pub impact: f64,
    pub effort: EffortLevel,
    pub due: NaiveDate,
    /// Value of a severity field, checked against the critical label set.
    #[serde(default)]
    pub severity: Option<String>,
}

impl ScoreableItem {
    pub fn new(
        identifier: impl Into<String>,
        impact: f64,
        effort: EffortLevel,
        due: NaiveDate,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            labels: Vec::new(),
            impact,
            effort,
            due,
            severity: None,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }
}

/// Parse a due date as sent by project trackers.
///
/// Accepts a bare `YYYY-MM-DD` date or a full RFC 3339 timestamp, in which
/// case the calendar date in the timestamp's own offset is used.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::MalformedDate {
            value: raw.to_string(),
        })
}
