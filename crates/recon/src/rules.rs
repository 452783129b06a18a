//! Plausibility rules for a single extracted record.
//!
//! Rules run in a fixed order and each sees the record as left by the previous
//! one. A rule emits at most one warning and fixes at most its own field.
//! Every fix is written to `record.corrections`; a field that already carries
//! a correction is skipped, which keeps a second run on the output stable.

use log::debug;

use crate::config::EngineConfig;
use crate::model::{
    Correction, ExtractedRecord, Field, FieldValue, Severity, ValidationWarning,
};

/// Headcounts up to this value are treated as clause/article numbers.
pub const CLAUSE_NUMBER_MAX: i64 = 30;
/// Above this, a headcount is suspected to be a total meal count.
pub const HEADCOUNT_SUSPECT_ABOVE: i64 = 1_000;
/// From this value on, a headcount is certainly a total meal count.
pub const HEADCOUNT_CERTAIN_FROM: i64 = 10_000;
/// Smallest derived per-day headcount accepted as a fix below `HEADCOUNT_CERTAIN_FROM`.
pub const DERIVED_HEADCOUNT_MIN: i64 = 10;
/// Headcounts below this are plausible only for a single facility.
pub const HEADCOUNT_SINGLE_FACILITY_BELOW: i64 = 10;

pub const MEALS_PER_DAY_MAX: i64 = 5;

pub const DURATION_MAX_DAYS: i64 = 500;
pub const DURATION_SHORT_BELOW: i64 = 30;

pub const TOTAL_MEALS_LARGE_ABOVE: i128 = 50_000_000;
pub const TOTAL_MEALS_SMALL_BELOW: i128 = 1_000;

pub const BUDGET_LOW_BELOW: f64 = 50_000.0;
pub const PER_MEAL_CHEAP_BELOW: f64 = 10.0;
pub const PER_MEAL_PREMIUM_ABOVE: f64 = 200.0;

/// Longest provenance excerpt quoted in a message, in characters.
const EXCERPT_QUOTE_CHARS: usize = 200;

type Rule = fn(&mut ExtractedRecord, &EngineConfig) -> Option<ValidationWarning>;

/// Execution order is part of the contract: later rules observe earlier fixes.
const RULES: [Rule; 5] = [
    check_headcount,
    check_meals_per_day,
    check_duration,
    check_cross_field,
    check_budget,
];

/// Run every field rule over `record` in place and return the warnings.
pub fn apply_rules(record: &mut ExtractedRecord, config: &EngineConfig) -> Vec<ValidationWarning> {
    RULES
        .iter()
        .filter_map(|rule| rule(record, config))
        .inspect(|w| debug!("{} [{}]: {}", w.field, w.severity, w.message))
        .collect()
}

// ---------------------------------------------------------------------------
// Headcount
// ---------------------------------------------------------------------------

pub fn check_headcount(
    record: &mut ExtractedRecord,
    _config: &EngineConfig,
) -> Option<ValidationWarning> {
    if record.is_corrected(Field::Headcount) {
        return None;
    }

    let Some(n) = record.headcount else {
        return Some(ValidationWarning::new(
            Field::Headcount,
            Severity::Info,
            "headcount not found in the extraction output",
        ));
    };

    if n > 0 && n <= CLAUSE_NUMBER_MAX {
        let mut message = format!(
            "headcount {n} is too small for a catering contract and is most likely a clause \
             number (e.g. \"{n}-Contractor\") read as a headcount; cleared, manual review required"
        );
        if let Some(excerpt) = source_excerpt(record, Field::Headcount) {
            message.push_str(&format!("; source excerpt: \"{excerpt}\""));
        }
        set_headcount(record, n, None);
        return Some(
            ValidationWarning::new(Field::Headcount, Severity::Error, message)
                .original(FieldValue::Count(n))
                .fixed(),
        );
    }

    if n > HEADCOUNT_SUSPECT_ABOVE {
        return Some(check_large_headcount(record, n));
    }

    if n < HEADCOUNT_SINGLE_FACILITY_BELOW {
        let message = if n <= 0 {
            format!("headcount {n} is not a positive number of people; manual review required")
        } else {
            format!(
                "headcount {n} is very low; the extraction probably read a single facility or \
                 table; if the document lists several facilities, check their total"
            )
        };
        return Some(
            ValidationWarning::new(Field::Headcount, Severity::Warning, message)
                .original(FieldValue::Count(n)),
        );
    }

    None
}

/// Headcount above 1000: likely a total meal count mistaken for people per day.
///
/// Meals per day that a later rule defaulted (it carries a correction) count
/// as unknown: on the first run this rule saw the impossible value, so a
/// second run must reach the same verdict.
fn check_large_headcount(record: &mut ExtractedRecord, n: i64) -> ValidationWarning {
    let certain = n >= HEADCOUNT_CERTAIN_FROM;
    let meals_per_day = record
        .meals_per_day
        .filter(|_| !record.is_corrected(Field::MealsPerDay));

    let (meals, days) = match (meals_per_day, record.duration_days) {
        (Some(m), Some(d)) if m > 0 && d > 0 => (m, d),
        _ => {
            let severity = if n > HEADCOUNT_CERTAIN_FROM {
                Severity::Error
            } else {
                Severity::Warning
            };
            let message = format!(
                "headcount {} is implausibly high and is probably a total meal count or a sum \
                 over all facilities; meals per day and duration are not both known, so it \
                 cannot be recomputed; manual review required",
                group_thousands(n)
            );
            return ValidationWarning::new(Field::Headcount, severity, message)
                .original(FieldValue::Count(n));
        }
    };

    let derived = (n as f64 / days as f64 / meals as f64).round() as i64;
    let formula = format!(
        "{} / {days} days / {meals} meals per day = {derived}",
        group_thousands(n)
    );

    if certain {
        set_headcount(record, n, Some(derived));
        let message = format!(
            "headcount {} is almost certainly a total meal count, not people per day; \
             corrected to {derived} ({formula})",
            group_thousands(n)
        );
        return ValidationWarning::new(Field::Headcount, Severity::Error, message)
            .original(FieldValue::Count(n))
            .suggested(FieldValue::Count(derived))
            .fixed();
    }

    if derived >= DERIVED_HEADCOUNT_MIN {
        set_headcount(record, n, Some(derived));
        let message = format!(
            "headcount {} looks like a total meal count; corrected to {derived} ({formula}); \
             fix manually if this is wrong",
            group_thousands(n)
        );
        return ValidationWarning::new(Field::Headcount, Severity::Warning, message)
            .original(FieldValue::Count(n))
            .suggested(FieldValue::Count(derived))
            .fixed();
    }

    let message = format!(
        "headcount {} is suspiciously high; recomputing it as a total meal count gives \
         {formula}, below the plausible minimum of {DERIVED_HEADCOUNT_MIN}, so the value was \
         left unchanged; manual review required",
        group_thousands(n)
    );
    ValidationWarning::new(Field::Headcount, Severity::Warning, message)
        .original(FieldValue::Count(n))
}

fn set_headcount(record: &mut ExtractedRecord, original: i64, corrected: Option<i64>) {
    record.headcount = corrected;
    record.corrections.insert(
        Field::Headcount,
        Correction {
            original: Some(FieldValue::Count(original)),
            corrected: corrected.map(FieldValue::Count),
        },
    );
}

// ---------------------------------------------------------------------------
// Meals per day
// ---------------------------------------------------------------------------

pub fn check_meals_per_day(
    record: &mut ExtractedRecord,
    config: &EngineConfig,
) -> Option<ValidationWarning> {
    if record.is_corrected(Field::MealsPerDay) {
        return None;
    }

    let Some(m) = record.meals_per_day else {
        return Some(ValidationWarning::new(
            Field::MealsPerDay,
            Severity::Info,
            "meals per day not found in the extraction output",
        ));
    };

    if m > MEALS_PER_DAY_MAX {
        let message = format!(
            "meals per day {m} is implausible (usually 2-3); left unchanged, manual review required"
        );
        return Some(
            ValidationWarning::new(Field::MealsPerDay, Severity::Warning, message)
                .original(FieldValue::Count(m)),
        );
    }

    if m < 1 {
        let fixed = config.default_meals_per_day;
        record.meals_per_day = Some(fixed);
        record.corrections.insert(
            Field::MealsPerDay,
            Correction {
                original: Some(FieldValue::Count(m)),
                corrected: Some(FieldValue::Count(fixed)),
            },
        );
        let message = format!(
            "meals per day {m} is impossible; corrected to the default of {fixed} meals per day"
        );
        return Some(
            ValidationWarning::new(Field::MealsPerDay, Severity::Error, message)
                .original(FieldValue::Count(m))
                .suggested(FieldValue::Count(fixed))
                .fixed(),
        );
    }

    None
}

// ---------------------------------------------------------------------------
// Duration
// ---------------------------------------------------------------------------

pub fn check_duration(
    record: &mut ExtractedRecord,
    _config: &EngineConfig,
) -> Option<ValidationWarning> {
    let Some(d) = record.duration_days else {
        return Some(ValidationWarning::new(
            Field::DurationDays,
            Severity::Info,
            "contract duration not found in the extraction output",
        ));
    };

    if d > DURATION_MAX_DAYS {
        let years = (d as f64 / 365.0).round() as i64;
        let message = format!(
            "duration of {d} days (about {years} years) is unusually long; left unchanged, verify it"
        );
        return Some(
            ValidationWarning::new(Field::DurationDays, Severity::Warning, message)
                .original(FieldValue::Count(d)),
        );
    }

    if d > 0 && d < DURATION_SHORT_BELOW {
        let message =
            format!("duration of {d} days is shorter than a month; left unchanged, verify it");
        return Some(
            ValidationWarning::new(Field::DurationDays, Severity::Warning, message)
                .original(FieldValue::Count(d)),
        );
    }

    if d <= 0 {
        let message = format!(
            "duration of {d} days is impossible and cannot be recomputed; manual review required"
        );
        return Some(
            ValidationWarning::new(Field::DurationDays, Severity::Error, message)
                .original(FieldValue::Count(d)),
        );
    }

    None
}

// ---------------------------------------------------------------------------
// Cross-field
// ---------------------------------------------------------------------------

pub fn check_cross_field(
    record: &mut ExtractedRecord,
    _config: &EngineConfig,
) -> Option<ValidationWarning> {
    let total = record.total_meals()?;
    let (h, m, d) = (
        record.headcount.unwrap_or_default(),
        record.meals_per_day.unwrap_or_default(),
        record.duration_days.unwrap_or_default(),
    );

    if total > TOTAL_MEALS_LARGE_ABOVE {
        let message = format!(
            "total of {} meals ({h} people x {m} meals x {d} days) is too large; verify the figures",
            group_thousands(total)
        );
        return Some(
            ValidationWarning::new(Field::CrossCheck, Severity::Warning, message)
                .original(total_value(total)),
        );
    }

    if total < TOTAL_MEALS_SMALL_BELOW {
        let message = format!(
            "total of {} meals ({h} people x {m} meals x {d} days); small-scale project",
            group_thousands(total)
        );
        return Some(
            ValidationWarning::new(Field::CrossCheck, Severity::Info, message)
                .original(total_value(total)),
        );
    }

    None
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

pub fn check_budget(
    record: &mut ExtractedRecord,
    config: &EngineConfig,
) -> Option<ValidationWarning> {
    if record.is_corrected(Field::EstimatedBudget) {
        return None;
    }

    let currency = &config.currency;

    let Some(budget) = record.estimated_budget else {
        return Some(derive_budget(record, config));
    };

    if budget < BUDGET_LOW_BELOW {
        let message = format!(
            "budget of {} {currency} is very low for a catering contract; left unchanged, verify it",
            fmt_amount(budget)
        );
        return Some(
            ValidationWarning::new(Field::EstimatedBudget, Severity::Warning, message)
                .original(FieldValue::Amount(budget)),
        );
    }

    let total = record.total_meals()?;
    let per_meal = budget / total as f64;

    if per_meal < PER_MEAL_CHEAP_BELOW {
        let message = format!(
            "budget of {} {currency} over {} meals is {per_meal:.2} {currency} per meal, \
             too cheap to be credible; verify the budget and the meal figures",
            fmt_amount(budget),
            group_thousands(total)
        );
        return Some(
            ValidationWarning::new(Field::EstimatedBudget, Severity::Warning, message)
                .original(FieldValue::Amount(budget)),
        );
    }

    if per_meal > PER_MEAL_PREMIUM_ABOVE {
        let message = format!(
            "budget of {} {currency} over {} meals is {per_meal:.2} {currency} per meal; \
             premium pricing, not necessarily an error",
            fmt_amount(budget),
            group_thousands(total)
        );
        return Some(
            ValidationWarning::new(Field::EstimatedBudget, Severity::Info, message)
                .original(FieldValue::Amount(budget)),
        );
    }

    None
}

fn derive_budget(record: &mut ExtractedRecord, config: &EngineConfig) -> ValidationWarning {
    let Some(total) = record.total_meals() else {
        return ValidationWarning::new(
            Field::EstimatedBudget,
            Severity::Info,
            "budget not found and cannot be derived: headcount, meals per day and duration \
             are not all known",
        );
    };

    let Some(unit_cost) = config.unit_meal_cost else {
        return ValidationWarning::new(
            Field::EstimatedBudget,
            Severity::Info,
            "budget not found and cannot be derived: no unit meal cost is configured",
        );
    };

    if total == i128::MAX {
        return ValidationWarning::new(
            Field::EstimatedBudget,
            Severity::Info,
            "budget not found and cannot be derived: the total meal count is out of range",
        );
    }

    let estimate = total as f64 * unit_cost;
    record.estimated_budget = Some(estimate);
    record.corrections.insert(
        Field::EstimatedBudget,
        Correction {
            original: None,
            corrected: Some(FieldValue::Amount(estimate)),
        },
    );

    let currency = &config.currency;
    let message = format!(
        "budget not found; estimated as {} {currency} ({} people x {} meals x {} days x \
         {} {currency} per meal)",
        fmt_amount(estimate),
        record.headcount.unwrap_or_default(),
        record.meals_per_day.unwrap_or_default(),
        record.duration_days.unwrap_or_default(),
        fmt_amount(unit_cost),
    );
    ValidationWarning::new(Field::EstimatedBudget, Severity::Info, message)
        .suggested(FieldValue::Amount(estimate))
        .fixed()
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn source_excerpt(record: &ExtractedRecord, field: Field) -> Option<String> {
    let excerpt = record.sources.get(field)?.excerpt.as_deref()?.trim();
    if excerpt.is_empty() {
        return None;
    }
    let mut quoted: String = excerpt.chars().take(EXCERPT_QUOTE_CHARS).collect();
    if excerpt.chars().count() > EXCERPT_QUOTE_CHARS {
        quoted.push_str("...");
    }
    Some(quoted)
}

pub(crate) fn total_value(total: i128) -> FieldValue {
    i64::try_from(total)
        .map(FieldValue::Count)
        .unwrap_or(FieldValue::Amount(total as f64))
}

/// `12000` → `12,000`.
pub(crate) fn group_thousands(n: impl Into<i128>) -> String {
    let n: i128 = n.into();
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole amounts print grouped, fractional ones keep two decimals.
pub(crate) fn fmt_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e18 {
        group_thousands(amount as i64)
    } else {
        format!("{amount:.2}")
    }
}
