//! Effort levels and their dampening factors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Discrete effort estimate attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffortLevel {
    #[serde(rename = "XS")]
    ExtraSmall,
    Small,
    Medium,
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
}

impl EffortLevel {
    pub const ALL: [EffortLevel; 5] = [
        EffortLevel::ExtraSmall,
        EffortLevel::Small,
        EffortLevel::Medium,
        EffortLevel::Large,
        EffortLevel::ExtraLarge,
    ];

    /// Share of the impact-derived reduction that is given back.
    ///
    /// - XS: 0.00 (full reduction kept)
    /// - Small: 0.10
    /// - Medium: 0.25
    /// - Large: 0.40
    /// - XL: 0.60
    ///
    /// Always below 1.0, so effort never cancels impact entirely.
    pub fn dampening_factor(self) -> f64 {
        match self {
            EffortLevel::ExtraSmall => 0.0,
            EffortLevel::Small => 0.10,
            EffortLevel::Medium => 0.25,
            EffortLevel::Large => 0.40,
            EffortLevel::ExtraLarge => 0.60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffortLevel::ExtraSmall => "XS",
            EffortLevel::Small => "Small",
            EffortLevel::Medium => "Medium",
            EffortLevel::Large => "Large",
            EffortLevel::ExtraLarge => "XL",
        }
    }
}

/// Dampening factor for an effort level.
pub fn normalize(effort: EffortLevel) -> f64 {
    effort.dampening_factor()
}

impl fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffortLevel {
    type Err = ValidationError;

    /// Accepts `XS`, `S`/`Small`, `M`/`Medium`, `L`/`Large`, `XL` and the
    /// spelled-out `Extra Small`/`Extra Large`, ignoring case and any
    /// trailing parenthetical such as `Large (2 weeks)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let head = s.split('(').next().unwrap_or_default();
        let key: String = head
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match key.as_str() {
            "xs" | "extra small" | "extra-small" => Ok(EffortLevel::ExtraSmall),
            "s" | "small" => Ok(EffortLevel::Small),
            "m" | "medium" => Ok(EffortLevel::Medium),
            "l" | "large" => Ok(EffortLevel::Large),
            "xl" | "extra large" | "extra-large" => Ok(EffortLevel::ExtraLarge),
            _ => Err(ValidationError::UnknownEffort {
                value: s.to_string(),
            }),
        }
    }
}
