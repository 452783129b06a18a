use crate::model::{
    Confidence, ConfidenceLevel, ExtractedRecord, Field, FieldConfidence, Severity,
    SeverityCounts, ValidationStatus, ValidationSummary, ValidationWarning,
};

const ERROR_PENALTY: f64 = 0.3;
const WARNING_PENALTY: f64 = 0.15;
const HIGH_CONFIDENCE_FROM: f64 = 0.8;
const MEDIUM_CONFIDENCE_FROM: f64 = 0.5;

/// Compute summary statistics from the warnings of one validation run.
pub fn compute_summary(warnings: &[ValidationWarning], record: &ExtractedRecord) -> ValidationSummary {
    let mut by_severity = SeverityCounts::default();
    let mut auto_fixed_count = 0;

    for w in warnings {
        match w.severity {
            Severity::Error => by_severity.error += 1,
            Severity::Warning => by_severity.warning += 1,
            Severity::Info => by_severity.info += 1,
        }
        if w.auto_fixed {
            auto_fixed_count += 1;
        }
    }

    let status = if by_severity.error > 0 {
        ValidationStatus::Error
    } else if by_severity.warning > 0 {
        ValidationStatus::Warning
    } else {
        ValidationStatus::Valid
    };

    ValidationSummary {
        total_warnings: warnings.len(),
        by_severity,
        auto_fixed_count,
        status,
        is_valid: status != ValidationStatus::Error,
        confidence: compute_confidence(warnings, record),
    }
}

/// Per-field score: 1.0 minus penalties for that field's errors and
/// warnings, averaged with the model's own confidence when it gave one.
pub fn compute_confidence(warnings: &[ValidationWarning], record: &ExtractedRecord) -> Confidence {
    let score = |field: Field| -> f64 {
        let (errors, warns) = warnings
            .iter()
            .filter(|w| w.field == field)
            .fold((0u32, 0u32), |(e, w), warning| match warning.severity {
                Severity::Error => (e + 1, w),
                Severity::Warning => (e, w + 1),
                Severity::Info => (e, w),
            });

        let mut score = 1.0 - f64::from(errors) * ERROR_PENALTY - f64::from(warns) * WARNING_PENALTY;
        if let Some(model) = record.sources.get(field).and_then(|s| s.confidence) {
            score = (score + model) / 2.0;
        }
        score.clamp(0.0, 1.0)
    };

    let fields = FieldConfidence {
        headcount: score(Field::Headcount),
        meals_per_day: score(Field::MealsPerDay),
        duration_days: score(Field::DurationDays),
        estimated_budget: score(Field::EstimatedBudget),
    };

    let overall = (fields.headcount
        + fields.meals_per_day
        + fields.duration_days
        + fields.estimated_budget)
        / 4.0;

    let level = if overall >= HIGH_CONFIDENCE_FROM {
        ConfidenceLevel::High
    } else if overall >= MEDIUM_CONFIDENCE_FROM {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    Confidence { overall, fields, level }
}
