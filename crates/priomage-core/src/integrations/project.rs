//! Project model: field definitions and items as fetched from a Projects V2 board.
//!
//! This is the filtering seam between raw tracker data and the scoring core.
//! [`ProjectItem::to_candidate`] turns an item into a [`ScoringCandidate`] only
//! when impact, effort and due date are all present.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ItemError, ValidationError};
use crate::item::{parse_due_date, ScoreableItem};
use crate::planner::ScoringCandidate;
use crate::scoring::{DestinationField, EffortLevel, FieldValue, SelectOption};
use crate::storage::FieldNames;

/// Project metadata and its custom field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub title: String,
    pub fields: Vec<ProjectField>,
}

impl ProjectInfo {
    /// Field with the given name, compared case-insensitively.
    pub fn field(&self, name: &str) -> Option<&ProjectField> {
        self.fields
            .iter()
            .find(|f| f.name.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// First field matching one of `candidates`, in candidate order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FieldNotFound`] when no candidate exists.
    pub fn find_priority_field(&self, candidates: &[String]) -> Result<&ProjectField, ConfigError> {
        candidates
            .iter()
            .find_map(|name| self.field(name))
            .ok_or_else(|| ConfigError::FieldNotFound {
                candidates: candidates.join(", "),
            })
    }
}

/// A custom field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectField {
    pub id: String,
    pub name: String,
    /// GitHub data type, e.g. `NUMBER`, `TEXT`, `DATE`, `SINGLE_SELECT`.
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl ProjectField {
    /// Storage representation of this field as a score destination.
    ///
    /// # Errors
    ///
    /// Fields other than NUMBER, TEXT and SINGLE_SELECT cannot hold a score.
    pub fn destination(&self) -> Result<DestinationField, ConfigError> {
        match self.data_type.as_str() {
            "NUMBER" => Ok(DestinationField::Number),
            "TEXT" => Ok(DestinationField::Text),
            "SINGLE_SELECT" => Ok(DestinationField::SingleSelect {
                options: self.options.clone(),
            }),
            other => Err(ConfigError::UnsupportedFieldType {
                name: self.name.clone(),
                data_type: other.to_string(),
            }),
        }
    }
}

/// What a project item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Issue,
    PullRequest,
    DraftIssue,
    Other,
}

impl ContentKind {
    pub fn from_typename(typename: &str) -> Self {
        match typename {
            "Issue" => ContentKind::Issue,
            "PullRequest" => ContentKind::PullRequest,
            "DraftIssue" => ContentKind::DraftIssue,
            _ => ContentKind::Other,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ContentKind::Issue => "Issue",
            ContentKind::PullRequest => "PR",
            ContentKind::DraftIssue => "Draft",
            ContentKind::Other => "Item",
        }
    }
}

/// A custom field value on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectFieldValue {
    Number { number: f64 },
    Text { text: String },
    Date { date: String },
    SingleSelect { option_id: Option<String>, name: String },
}

impl ProjectFieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            ProjectFieldValue::Number { .. } => "number",
            ProjectFieldValue::Text { .. } => "text",
            ProjectFieldValue::Date { .. } => "date",
            ProjectFieldValue::SingleSelect { .. } => "single select",
        }
    }

    /// Whether the value holds nothing meaningful (blank text or option).
    fn is_blank(&self) -> bool {
        match self {
            ProjectFieldValue::Text { text } => text.trim().is_empty(),
            ProjectFieldValue::Date { date } => date.trim().is_empty(),
            ProjectFieldValue::SingleSelect { name, .. } => name.trim().is_empty(),
            ProjectFieldValue::Number { .. } => false,
        }
    }

    /// Textual reading for text-like values.
    fn as_text(&self) -> Option<&str> {
        match self {
            ProjectFieldValue::Text { text } => Some(text),
            ProjectFieldValue::Date { date } => Some(date),
            ProjectFieldValue::SingleSelect { name, .. } => Some(name),
            ProjectFieldValue::Number { .. } => None,
        }
    }

    /// The value as the destination adapter would have written it.
    pub fn to_field_value(&self) -> Option<FieldValue> {
        match self {
            ProjectFieldValue::Number { number } => Some(FieldValue::Number { number: *number }),
            ProjectFieldValue::Text { text } => Some(FieldValue::Text { text: text.clone() }),
            ProjectFieldValue::SingleSelect { option_id, name } => Some(FieldValue::SingleSelect {
                option_id: option_id.clone().unwrap_or_default(),
                name: name.clone(),
            }),
            ProjectFieldValue::Date { .. } => None,
        }
    }
}

/// An item on the project board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    /// Project item node id, used when writing field values.
    pub project_item_id: String,
    pub kind: ContentKind,
    pub number: Option<u64>,
    pub title: String,
    /// `owner/name` of the repository, empty for draft issues.
    pub repository: String,
    pub labels: Vec<String>,
    /// Custom field values keyed by field name.
    pub field_values: IndexMap<String, ProjectFieldValue>,
}

impl ProjectItem {
    /// Reference used in reports, e.g. `acme/api#42`.
    pub fn identifier(&self) -> String {
        match self.number {
            Some(number) if !self.repository.is_empty() => format!("{}#{number}", self.repository),
            Some(number) => format!("#{number}"),
            None => self.project_item_id.clone(),
        }
    }

    /// Value of the named field, compared case-insensitively. Blank values
    /// count as absent.
    pub fn field_value(&self, name: &str) -> Option<&ProjectFieldValue> {
        self.field_values
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(name.trim()))
            .map(|(_, value)| value)
            .filter(|value| !value.is_blank())
    }

    /// Build the scoring input for this item.
    ///
    /// Returns `Ok(None)` when impact, effort or due date is missing; such
    /// items are not eligible for scoring.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] naming the field when a present value cannot
    /// be interpreted.
    pub fn to_candidate(
        &self,
        names: &FieldNames,
        destination: &ProjectField,
    ) -> Result<Option<ScoringCandidate>, ItemError> {
        let identifier = self.identifier();
        let (Some(impact), Some(effort), Some(due)) = (
            self.field_value(&names.impact),
            self.field_value(&names.effort),
            self.field_value(&names.due),
        ) else {
            debug!(item = %identifier, "missing impact, effort or due date; skipped");
            return Ok(None);
        };

        let fail = |err: ValidationError| ItemError::new(identifier.clone(), err);

        let impact = match impact {
            ProjectFieldValue::Number { number } => *number,
            ProjectFieldValue::Text { text } => {
                text.trim().parse::<f64>().map_err(|_| {
                    fail(ValidationError::WrongType {
                        field: "impact".into(),
                        message: format!("'{text}' is not a number"),
                    })
                })?
            }
            other => {
                return Err(fail(ValidationError::WrongType {
                    field: "impact".into(),
                    message: format!("expected a number, found a {} value", other.type_name()),
                }))
            }
        };

        let effort: EffortLevel = match effort.as_text() {
            Some(raw) if !matches!(effort, ProjectFieldValue::Date { .. }) => {
                raw.parse().map_err(fail)?
            }
            _ => {
                return Err(fail(ValidationError::WrongType {
                    field: "effort".into(),
                    message: format!("expected an effort level, found a {} value", effort.type_name()),
                }))
            }
        };

        let due = match due {
            ProjectFieldValue::Date { date } | ProjectFieldValue::Text { text: date } => {
                parse_due_date(date).map_err(fail)?
            }
            other => {
                return Err(fail(ValidationError::WrongType {
                    field: "due".into(),
                    message: format!("expected a date, found a {} value", other.type_name()),
                }))
            }
        };

        let mut item = ScoreableItem::new(identifier, impact, effort, due).with_labels(self.labels.iter().cloned());
        if let Some(severity) = self.field_value(&names.critical).and_then(|v| v.as_text()) {
            item = item.with_severity(severity.trim());
        }

        Ok(Some(ScoringCandidate {
            item,
            target: self.project_item_id.clone(),
            current: self
                .field_value(&destination.name)
                .and_then(ProjectFieldValue::to_field_value),
        }))
    }
}
