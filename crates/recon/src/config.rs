use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Engine configuration.
///
/// `unit_meal_cost` has no built-in value: when the caller does not supply
/// one, a missing budget is reported as not derivable instead of guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Cost of a single meal, in `currency`, used to derive a missing budget.
    #[serde(default)]
    pub unit_meal_cost: Option<f64>,
    /// Currency label used in budget messages.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Run the anomaly pass after the field rules.
    #[serde(default)]
    pub anomaly_detection: bool,
    /// Replacement for a meals-per-day value below 1.
    #[serde(default = "default_meals_per_day")]
    pub default_meals_per_day: i64,
}

fn default_currency() -> String {
    "TRY".into()
}

fn default_meals_per_day() -> i64 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unit_meal_cost: None,
            currency: default_currency(),
            anomaly_detection: false,
            default_meals_per_day: default_meals_per_day(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style override used by callers that take the cost from flags.
    pub fn with_unit_meal_cost(mut self, cost: f64) -> Self {
        self.unit_meal_cost = Some(cost);
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(cost) = self.unit_meal_cost {
            if !cost.is_finite() || cost <= 0.0 {
                return Err(EngineError::ConfigValidation(format!(
                    "unit_meal_cost must be a positive number, got {cost}"
                )));
            }
        }

        if !(1..=5).contains(&self.default_meals_per_day) {
            return Err(EngineError::ConfigValidation(format!(
                "default_meals_per_day must be between 1 and 5, got {}",
                self.default_meals_per_day
            )));
        }

        if self.currency.trim().is_empty() {
            return Err(EngineError::ConfigValidation(
                "currency must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let input = r#"
unit_meal_cost = 12.5
currency = "EUR"
anomaly_detection = true
default_meals_per_day = 2
"#;
        let config = EngineConfig::from_toml(input).unwrap();
        assert_eq!(config.unit_meal_cost, Some(12.5));
        assert_eq!(config.currency, "EUR");
        assert!(config.anomaly_detection);
        assert_eq!(config.default_meals_per_day, 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.unit_meal_cost.is_none());
        assert_eq!(config.currency, "TRY");
        assert_eq!(config.default_meals_per_day, 3);
    }

    #[test]
    fn integer_cost_is_accepted() {
        let config = EngineConfig::from_toml("unit_meal_cost = 12").unwrap();
        assert_eq!(config.unit_meal_cost, Some(12.0));
    }

    #[test]
    fn reject_non_positive_cost() {
        let err = EngineConfig::from_toml("unit_meal_cost = 0").unwrap_err();
        assert!(err.to_string().contains("unit_meal_cost"));

        let err = EngineConfig::from_toml("unit_meal_cost = -4.0").unwrap_err();
        assert!(matches!(err, EngineError::ConfigValidation(_)));
    }

    #[test]
    fn reject_out_of_range_default_meals() {
        let err = EngineConfig::from_toml("default_meals_per_day = 9").unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));
    }

    #[test]
    fn reject_blank_currency() {
        let err = EngineConfig::from_toml("currency = \"  \"").unwrap_err();
        assert!(err.to_string().contains("currency"));
    }

    #[test]
    fn reject_unknown_key() {
        let err = EngineConfig::from_toml("unit_cost = 12").unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn with_unit_meal_cost_overrides() {
        let config = EngineConfig::default().with_unit_meal_cost(14.0);
        assert_eq!(config.unit_meal_cost, Some(14.0));
        assert!(config.validate().is_ok());
    }
}
