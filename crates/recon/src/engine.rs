use serde::Deserialize;
use serde_json::Value;

use crate::anomaly::detect_anomalies;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evidence::compute_summary;
use crate::model::{
    ExtractedRecord, Field, Severity, ValidationOutcome, ValidationWarning, WarningOrigin,
};
use crate::parse::parse_record_response;
use crate::rules::apply_rules;

/// Validation engine. Construct once and share by reference; holds only the
/// validated configuration, so concurrent use needs no coordination.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the field rules (and the anomaly pass when enabled) over a copy
    /// of `record`. The input is never modified.
    pub fn validate(&self, record: &ExtractedRecord) -> ValidationOutcome {
        run(&self.config, record)
    }

    /// Validate an untyped value. A value that is not a record is treated as
    /// the empty record, with one `error` warning explaining why.
    pub fn validate_value(&self, value: &Value) -> ValidationOutcome {
        match ExtractedRecord::deserialize(value) {
            Ok(record) => self.validate(&record),
            Err(e) => {
                log::warn!("input is not an extracted record ({e}); validating as empty");
                let coerced = ValidationWarning::new(
                    Field::Record,
                    Severity::Error,
                    format!("input is not an extracted record ({e}); treated as empty"),
                )
                .from_origin(WarningOrigin::Boundary);
                let mut outcome = self.validate(&ExtractedRecord::default());
                outcome.warnings.insert(0, coerced);
                outcome.summary = compute_summary(&outcome.warnings, &outcome.record);
                outcome
            }
        }
    }

    /// Extract the JSON object from a raw model response, parse it, validate.
    pub fn validate_response(&self, text: &str) -> Result<ValidationOutcome, EngineError> {
        let record = parse_record_response(text)?;
        Ok(self.validate(&record))
    }
}

/// Validate one record. `config` must already have passed
/// [`EngineConfig::validate`]; [`Engine::new`] is the only public way in.
pub(crate) fn run(config: &EngineConfig, record: &ExtractedRecord) -> ValidationOutcome {
    debug_assert!(config.validate().is_ok(), "engine run with an unchecked config");
    let mut record = record.clone();
    let mut warnings = apply_rules(&mut record, config);

    if config.anomaly_detection {
        warnings.extend(detect_anomalies(&record, &config.currency));
    }

    let fix_count = warnings.iter().filter(|w| w.auto_fixed).count();
    let summary = compute_summary(&warnings, &record);

    log::info!(
        "validated record: {} warnings, {} auto-fixed, status {:?}",
        warnings.len(),
        fix_count,
        summary.status
    );

    ValidationOutcome {
        record,
        warnings,
        fix_count,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldValue, ValidationStatus};
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default().with_unit_meal_cost(12.0)).unwrap()
    }

    fn record(h: Option<i64>, m: Option<i64>, d: Option<i64>, b: Option<f64>) -> ExtractedRecord {
        ExtractedRecord {
            headcount: h,
            meals_per_day: m,
            duration_days: d,
            estimated_budget: b,
            ..Default::default()
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = EngineConfig {
            default_meals_per_day: 9,
            ..Default::default()
        };
        assert!(matches!(Engine::new(config), Err(EngineError::ConfigValidation(_))));

        let nan = EngineConfig::default().with_unit_meal_cost(f64::NAN);
        assert!(matches!(Engine::new(nan), Err(EngineError::ConfigValidation(_))));
    }

    #[test]
    #[should_panic(expected = "unchecked config")]
    #[cfg(debug_assertions)]
    fn run_rejects_unchecked_config() {
        let config = EngineConfig {
            unit_meal_cost: Some(f64::NAN),
            ..Default::default()
        };
        run(&config, &ExtractedRecord::default());
    }

    #[test]
    fn input_is_not_mutated() {
        let input = record(Some(12), Some(3), Some(365), None);
        let outcome = engine().validate(&input);
        assert_eq!(input.headcount, Some(12));
        assert!(input.corrections.is_empty());
        assert_eq!(outcome.record.headcount, None);
    }

    #[test]
    fn fix_count_matches_auto_fixed() {
        let outcome = engine().validate(&record(Some(12_000), Some(3), Some(365), None));
        assert_eq!(outcome.record.headcount, Some(11));
        let fixed = outcome.warnings.iter().filter(|w| w.auto_fixed).count();
        assert_eq!(outcome.fix_count, fixed);
        assert_eq!(outcome.summary.auto_fixed_count, fixed);
        assert_eq!(outcome.summary.status, ValidationStatus::Error);
    }

    #[test]
    fn derived_budget_example() {
        let outcome = engine().validate(&record(Some(100), Some(3), Some(30), None));
        assert_eq!(outcome.record.estimated_budget, Some(108_000.0));
        let w = outcome
            .warnings
            .iter()
            .find(|w| w.field == Field::EstimatedBudget)
            .unwrap();
        assert_eq!(w.severity, Severity::Info);
        assert!(w.auto_fixed);
        assert_eq!(w.suggested_value, Some(FieldValue::Amount(108_000.0)));
    }

    #[test]
    fn revalidation_is_stable_for_fixed_fields() {
        let e = engine();
        let first = e.validate(&record(Some(12_000), Some(3), Some(365), None));
        let fixed_fields: Vec<Field> = first
            .warnings
            .iter()
            .filter(|w| w.auto_fixed)
            .map(|w| w.field)
            .collect();
        assert!(!fixed_fields.is_empty());

        let second = e.validate(&first.record);
        assert_eq!(second.record, first.record);
        assert_eq!(second.fix_count, 0);
        for field in fixed_fields {
            assert!(
                second.warnings.iter().all(|w| w.field != field),
                "{field} warned again after its fix"
            );
        }
    }

    #[test]
    fn revalidation_keeps_unfixable_headcount_unfixed() {
        let e = engine();
        let first = e.validate(&record(Some(50_000), Some(0), Some(365), None));
        let second = e.validate(&first.record);

        assert_eq!(second.record.headcount, Some(50_000));
        let unfixed = |o: &ValidationOutcome| -> Vec<ValidationWarning> {
            o.warnings
                .iter()
                .filter(|w| !first.record.is_corrected(w.field))
                .cloned()
                .collect()
        };
        assert_eq!(unfixed(&second), unfixed(&first));
        assert_eq!(second.fix_count, 0);
    }

    #[test]
    fn extreme_counts_do_not_panic() {
        let mut config = engine().config().clone();
        config.anomaly_detection = true;
        let e = Engine::new(config).unwrap();
        let outcome = e.validate(&record(Some(1_000), Some(i64::MAX), Some(i64::MAX), Some(1e9)));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.field == Field::CrossCheck && w.origin == WarningOrigin::Anomaly));
        assert_eq!(e.validate(&outcome.record).warnings, outcome.warnings);
    }

    #[test]
    fn revalidation_repeats_unfixed_warnings() {
        let e = engine();
        let first = e.validate(&record(Some(1_500), Some(2), Some(250), Some(5_000_000.0)));
        assert_eq!(first.fix_count, 0);
        let second = e.validate(&first.record);
        assert_eq!(second.warnings, first.warnings);
    }

    #[test]
    fn anomaly_pass_is_opt_in() {
        let input = record(Some(250), Some(3), Some(1_000), Some(4_000_000.0));
        let off = engine().validate(&input);
        assert!(off.warnings.iter().all(|w| w.origin != WarningOrigin::Anomaly));

        let mut config = engine().config().clone();
        config.anomaly_detection = true;
        let on = Engine::new(config).unwrap().validate(&input);
        assert!(on.warnings.iter().any(|w| w.origin == WarningOrigin::Anomaly));
    }

    #[test]
    fn validate_value_coerces_wrong_shape() {
        let outcome = engine().validate_value(&json!(["not", "a", "record"]));
        assert_eq!(outcome.record.headcount, None);
        let first = &outcome.warnings[0];
        assert_eq!(first.field, Field::Record);
        assert_eq!(first.severity, Severity::Error);
        assert_eq!(first.origin, WarningOrigin::Boundary);
        assert!(!outcome.summary.is_valid);
        assert_eq!(outcome.summary.total_warnings, outcome.warnings.len());
    }

    #[test]
    fn validate_value_accepts_original_keys() {
        let outcome = engine().validate_value(&json!({ "kisi_sayisi": 8, "ogun_sayisi": 3, "gun_sayisi": 365 }));
        assert_eq!(outcome.record.headcount, None);
        assert_eq!(outcome.warnings[0].original_value, Some(FieldValue::Count(8)));
    }

    #[test]
    fn validate_response_extracts_json() {
        let text = "Sonuç:\n```json\n{\"headcount\": 250, \"meals_per_day\": 3, \"duration_days\": 365}\n```";
        let outcome = engine().validate_response(text).unwrap();
        assert_eq!(outcome.record.headcount, Some(250));
        assert!(matches!(
            engine().validate_response("no data"),
            Err(EngineError::NoJsonObject)
        ));
    }
}
