//! Outlier detection over an already-validated record.
//!
//! Flags only; never changes the record. Fields the rules already corrected
//! carry their own explanation and are not flagged again.

use crate::model::{
    ExtractedRecord, Field, FieldValue, Severity, ValidationWarning, WarningOrigin,
};
use crate::rules::{fmt_amount, group_thousands, total_value};

const HEADCOUNT_EXTREME_ABOVE: i64 = 10_000;
const HEADCOUNT_HIGH_ABOVE: i64 = 5_000;

const PER_MEAL_IMPOSSIBLE_BELOW: f64 = 5.0;
const PER_MEAL_EXTREME_ABOVE: f64 = 300.0;

const DURATION_LONG_ABOVE: i64 = 730;
const DURATION_EVENT_BELOW: i64 = 7;

const MEALS_UNUSUAL_ABOVE: i64 = 4;

const TOTAL_MEALS_IMPOSSIBLE_ABOVE: i128 = 100_000_000;
const TOTAL_MEALS_PILOT_BELOW: i128 = 100;

/// Statistical outlier checks, one warning per triggered check.
pub fn detect_anomalies(record: &ExtractedRecord, currency: &str) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(h) = record.headcount.filter(|_| !record.is_corrected(Field::Headcount)) {
        if h > HEADCOUNT_EXTREME_ABOVE {
            warnings.push(anomaly(
                Field::Headcount,
                Severity::Error,
                format!(
                    "headcount {} is far above any catering contract; probably a meal count or \
                     a wrong sum, urgent manual review required",
                    group_thousands(h)
                ),
                FieldValue::Count(h),
            ));
        } else if h > HEADCOUNT_HIGH_ABOVE {
            warnings.push(anomaly(
                Field::Headcount,
                Severity::Warning,
                format!(
                    "headcount {} is unusually high; the largest catering tenders normally \
                     serve fewer than {} people",
                    group_thousands(h),
                    group_thousands(HEADCOUNT_HIGH_ABOVE)
                ),
                FieldValue::Count(h),
            ));
        }
    }

    let budget = record
        .estimated_budget
        .filter(|_| !record.is_corrected(Field::EstimatedBudget));
    if let (Some(budget), Some(total)) = (budget, record.total_meals()) {
        let per_meal = budget / total as f64;
        if per_meal < PER_MEAL_IMPOSSIBLE_BELOW {
            warnings.push(anomaly(
                Field::EstimatedBudget,
                Severity::Error,
                format!(
                    "{per_meal:.2} {currency} per meal is impossibly low (budget {} {currency}, \
                     {} meals); the budget is probably wrong",
                    fmt_amount(budget),
                    group_thousands(total)
                ),
                FieldValue::Amount(budget),
            ));
        } else if per_meal > PER_MEAL_EXTREME_ABOVE {
            warnings.push(anomaly(
                Field::EstimatedBudget,
                Severity::Warning,
                format!(
                    "{per_meal:.2} {currency} per meal is extraordinarily high; unless this is a \
                     hotel or resort tender the figures are probably wrong"
                ),
                FieldValue::Amount(budget),
            ));
        }
    }

    if let Some(d) = record.duration_days.filter(|d| *d > 0) {
        if d > DURATION_LONG_ABOVE {
            warnings.push(anomaly(
                Field::DurationDays,
                Severity::Warning,
                format!(
                    "duration of {d} days ({:.1} years) is very long; catering contracts usually \
                     run for one year",
                    d as f64 / 365.0
                ),
                FieldValue::Count(d),
            ));
        } else if d < DURATION_EVENT_BELOW {
            warnings.push(anomaly(
                Field::DurationDays,
                Severity::Info,
                format!("duration of {d} days suggests an event or short-term service"),
                FieldValue::Count(d),
            ));
        }
    }

    if let Some(m) = record
        .meals_per_day
        .filter(|m| *m > MEALS_UNUSUAL_ABOVE && !record.is_corrected(Field::MealsPerDay))
    {
        warnings.push(anomaly(
            Field::MealsPerDay,
            Severity::Warning,
            format!(
                "{m} meals per day is unusual; plausible only if snacks are counted as meals"
            ),
            FieldValue::Count(m),
        ));
    }

    if let Some(total) = record.total_meals() {
        if total > TOTAL_MEALS_IMPOSSIBLE_ABOVE {
            warnings.push(anomaly(
                Field::CrossCheck,
                Severity::Error,
                format!(
                    "total of {} meals is physically implausible; all three figures may be wrong",
                    group_thousands(total)
                ),
                total_value(total),
            ));
        } else if total < TOTAL_MEALS_PILOT_BELOW {
            warnings.push(anomaly(
                Field::CrossCheck,
                Severity::Info,
                format!("total of {total} meals is tiny; possibly a pilot or demo tender"),
                total_value(total),
            ));
        }
    }

    warnings
}

fn anomaly(
    field: Field,
    severity: Severity,
    message: String,
    original: FieldValue,
) -> ValidationWarning {
    ValidationWarning::new(field, severity, message)
        .original(original)
        .from_origin(WarningOrigin::Anomaly)
}
