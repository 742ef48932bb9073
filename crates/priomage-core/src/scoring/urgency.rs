//! Due-date urgency bonus.
//!
//! The bonus decays exponentially with the number of whole days left:
//!
//! ```text
//! bonus(days) = max_bonus                              if days <= 0
//!             = max_bonus * 0.5^(days / half_life)     otherwise
//! ```
//!
//! With the defaults (90, 14 days) an item due today or overdue gets 90, one
//! due in two weeks gets 45, and one due in a year gets effectively nothing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_BONUS: f64 = 90.0;
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 14.0;

/// Whole days from `today` until `due`; negative when overdue.
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    due.signed_duration_since(today).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UrgencyCurve {
    max_bonus: f64,
    half_life_days: f64,
}

impl UrgencyCurve {
    pub fn new(max_bonus: f64, half_life_days: f64) -> Result<Self, ConfigError> {
        if !max_bonus.is_finite() || max_bonus < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "scoring.urgency.max_bonus".into(),
                message: format!("{max_bonus} must be a finite non-negative number"),
            });
        }
        if !half_life_days.is_finite() || half_life_days <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "scoring.urgency.half_life_days".into(),
                message: format!("{half_life_days} must be a positive number of days"),
            });
        }
        Ok(Self {
            max_bonus,
            half_life_days,
        })
    }

    pub fn max_bonus(&self) -> f64 {
        self.max_bonus
    }

    pub fn half_life_days(&self) -> f64 {
        self.half_life_days
    }

    /// Bonus for an item due on `due`, evaluated on `today`.
    pub fn urgency(&self, due: NaiveDate, today: NaiveDate) -> f64 {
        self.bonus_for_days(days_until(due, today))
    }

    /// Bonus for an item due in `days` whole days.
    pub fn bonus_for_days(&self, days: i64) -> f64 {
        if days <= 0 {
            // Overdue items are clamped at the maximum.
            return self.max_bonus;
        }
        self.max_bonus * 0.5f64.powf(days as f64 / self.half_life_days)
    }
}

impl Default for UrgencyCurve {
    fn default() -> Self {
        Self {
            max_bonus: DEFAULT_MAX_BONUS,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn due_today_gets_max() {
        let curve = UrgencyCurve::default();
        let today = date(2026, 5, 1);
        assert_eq!(curve.urgency(today, today), DEFAULT_MAX_BONUS);
    }

    #[test]
    fn overdue_is_clamped() {
        let curve = UrgencyCurve::default();
        let today = date(2026, 5, 1);
        let one_day = curve.urgency(date(2026, 4, 30), today);
        let hundred_days = curve.urgency(date(2026, 1, 21), today);
        assert_eq!(one_day, DEFAULT_MAX_BONUS);
        assert_eq!(one_day, hundred_days);
    }

    #[test]
    fn half_life_halves_the_bonus() {
        let curve = UrgencyCurve::default();
        let bonus = curve.bonus_for_days(14);
        assert!((bonus - 45.0).abs() < 1e-9);
        let bonus = curve.bonus_for_days(28);
        assert!((bonus - 22.5).abs() < 1e-9);
    }

    #[test]
    fn decreases_towards_zero() {
        let curve = UrgencyCurve::default();
        let mut previous = curve.bonus_for_days(0);
        for days in 1..400 {
            let bonus = curve.bonus_for_days(days);
            assert!(bonus <= previous);
            assert!(bonus >= 0.0);
            previous = bonus;
        }
        assert!(curve.bonus_for_days(365) < 0.01);
    }

    #[test]
    fn days_until_is_signed() {
        assert_eq!(days_until(date(2026, 5, 3), date(2026, 5, 1)), 2);
        assert_eq!(days_until(date(2026, 4, 29), date(2026, 5, 1)), -2);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(UrgencyCurve::new(-1.0, 14.0).is_err());
        assert!(UrgencyCurve::new(90.0, 0.0).is_err());
        assert!(UrgencyCurve::new(f64::INFINITY, 14.0).is_err());
        assert!(UrgencyCurve::new(50.0, 7.0).is_ok());
    }
}
