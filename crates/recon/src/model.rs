use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parse::de_count;

// ---------------------------------------------------------------------------
// Extracted record
// ---------------------------------------------------------------------------

/// Structured facts the extraction step produced for one document.
///
/// Keys the extraction prompt emits under their original names are accepted
/// as aliases. Anything else the model returned is kept in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(default, alias = "kisi_sayisi", deserialize_with = "de_count")]
    pub headcount: Option<i64>,
    #[serde(default, alias = "ogun_sayisi", deserialize_with = "de_count")]
    pub meals_per_day: Option<i64>,
    #[serde(default, alias = "gun_sayisi", deserialize_with = "de_count")]
    pub duration_days: Option<i64>,
    #[serde(default, alias = "tahmini_butce")]
    pub estimated_budget: Option<f64>,
    #[serde(default, alias = "_sources", skip_serializing_if = "FieldSources::is_empty")]
    pub sources: FieldSources,
    /// Fixes applied by an earlier validation run. A corrected field is not
    /// re-checked, so validating the output again is stable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub corrections: BTreeMap<Field, Correction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtractedRecord {
    pub fn is_corrected(&self, field: Field) -> bool {
        self.corrections.contains_key(&field)
    }

    /// `headcount × meals_per_day × duration_days` when all three are positive.
    /// A product beyond `i128` saturates to `i128::MAX`, which is above every
    /// threshold the rules compare against.
    pub fn total_meals(&self) -> Option<i128> {
        match (self.headcount, self.meals_per_day, self.duration_days) {
            (Some(h), Some(m), Some(d)) if h > 0 && m > 0 && d > 0 => Some(
                i128::from(h)
                    .checked_mul(i128::from(m))
                    .and_then(|hm| hm.checked_mul(i128::from(d)))
                    .unwrap_or(i128::MAX),
            ),
            _ => None,
        }
    }
}

/// Provenance the model attached to individual fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSources {
    #[serde(default, alias = "kisi_sayisi", skip_serializing_if = "Option::is_none")]
    pub headcount: Option<FieldSource>,
    #[serde(default, alias = "ogun_sayisi", skip_serializing_if = "Option::is_none")]
    pub meals_per_day: Option<FieldSource>,
    #[serde(default, alias = "gun_sayisi", skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<FieldSource>,
    #[serde(default, alias = "tahmini_butce", skip_serializing_if = "Option::is_none")]
    pub estimated_budget: Option<FieldSource>,
}

impl FieldSources {
    pub fn is_empty(&self) -> bool {
        self.headcount.is_none()
            && self.meals_per_day.is_none()
            && self.duration_days.is_none()
            && self.estimated_budget.is_none()
    }

    pub fn get(&self, field: Field) -> Option<&FieldSource> {
        match field {
            Field::Headcount => self.headcount.as_ref(),
            Field::MealsPerDay => self.meals_per_day.as_ref(),
            Field::DurationDays => self.duration_days.as_ref(),
            Field::EstimatedBudget => self.estimated_budget.as_ref(),
            Field::CrossCheck | Field::Record => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSource {
    /// Short excerpt the model claims to have read the value from.
    #[serde(default, alias = "proof", skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Model's own confidence in the value, 0..=1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// An automatic fix recorded on the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub original: Option<FieldValue>,
    pub corrected: Option<FieldValue>,
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Field a warning is about. `CrossCheck` covers the combined figures,
/// `Record` the record as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Headcount,
    MealsPerDay,
    DurationDays,
    CrossCheck,
    EstimatedBudget,
    Record,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Headcount => write!(f, "headcount"),
            Self::MealsPerDay => write!(f, "meals_per_day"),
            Self::DurationDays => write!(f, "duration_days"),
            Self::CrossCheck => write!(f, "cross_check"),
            Self::EstimatedBudget => write!(f, "estimated_budget"),
            Self::Record => write!(f, "record"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Which pass produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningOrigin {
    #[default]
    Rule,
    Anomaly,
    Boundary,
}

/// A value as it appeared in (or was written to) a record field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Count(i64),
    Amount(f64),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Amount(a) => write!(f, "{a:.2}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: Field,
    pub severity: Severity,
    pub message: String,
    pub original_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<FieldValue>,
    pub auto_fixed: bool,
    #[serde(default)]
    pub origin: WarningOrigin,
}

impl ValidationWarning {
    pub fn new(field: Field, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            field,
            severity,
            message: message.into(),
            original_value: None,
            suggested_value: None,
            auto_fixed: false,
            origin: WarningOrigin::Rule,
        }
    }

    pub fn original(mut self, value: FieldValue) -> Self {
        self.original_value = Some(value);
        self
    }

    pub fn suggested(mut self, value: FieldValue) -> Self {
        self.suggested_value = Some(value);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.auto_fixed = true;
        self
    }

    pub fn from_origin(mut self, origin: WarningOrigin) -> Self {
        self.origin = origin;
        self
    }
}

// ---------------------------------------------------------------------------
// Validation output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence {
    pub headcount: f64,
    pub meals_per_day: f64,
    pub duration_days: f64,
    pub estimated_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub overall: f64,
    pub fields: FieldConfidence,
    pub level: ConfidenceLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_warnings: usize,
    pub by_severity: SeverityCounts,
    pub auto_fixed_count: usize,
    pub status: ValidationStatus,
    pub is_valid: bool,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub record: ExtractedRecord,
    pub warnings: Vec<ValidationWarning>,
    pub fix_count: usize,
    pub summary: ValidationSummary,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Meals served per day, by meal. Meal keys other than the four named ones
/// (snacks, night meals) are kept in `extra` and summed on merge when numeric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealDistribution {
    #[serde(default, alias = "kahvalti", skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<u64>,
    #[serde(default, alias = "ogle", skip_serializing_if = "Option::is_none")]
    pub lunch: Option<u64>,
    #[serde(default, alias = "aksam", skip_serializing_if = "Option::is_none")]
    pub dinner: Option<u64>,
    #[serde(default, alias = "toplam", skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(alias = "ad")]
    pub name: String,
    #[serde(default, alias = "kisi_sayisi", skip_serializing_if = "Option::is_none")]
    pub headcount: Option<u64>,
    #[serde(default, alias = "ogun_dagilimi", skip_serializing_if = "Option::is_none")]
    pub meal_distribution: Option<MealDistribution>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "ad")]
    pub name: String,
    /// Free text ("2 adet", "50 kg"); never summed.
    #[serde(default, alias = "miktar", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, alias = "ozellik", skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentCategory {
    #[serde(alias = "kategori")]
    pub name: String,
    #[serde(default, alias = "urunler")]
    pub products: Vec<Product>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelPosition {
    #[serde(alias = "pozisyon")]
    pub role: String,
    #[serde(alias = "sayi")]
    pub count: u64,
    #[serde(default, alias = "nitelik", skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(default, alias = "maas", skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelDetails {
    #[serde(default, alias = "toplam_personel", skip_serializing_if = "Option::is_none")]
    pub total_personnel: Option<u64>,
    #[serde(default, alias = "pozisyonlar")]
    pub positions: Vec<PersonnelPosition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entity collections the table-intelligence step produced for one document.
///
/// Menu analysis, cost data, dates and the confidence score are not
/// interpreted here and ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableIntelligence {
    #[serde(default, alias = "kuruluslar", skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
    #[serde(default, alias = "ekipman_listesi", skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<EquipmentCategory>,
    #[serde(default, alias = "personel_detaylari", skip_serializing_if = "Option::is_none")]
    pub personnel: Option<PersonnelDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Before/after entity counts for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCounts {
    pub before: usize,
    pub after: usize,
}

impl PassCounts {
    pub fn merged(&self) -> usize {
        self.before.saturating_sub(self.after)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub organizations: PassCounts,
    /// Counted in products across all categories.
    pub equipment_products: PassCounts,
    pub personnel: PassCounts,
    pub duplicates_merged: usize,
    /// Collections that failed to parse and were passed through unmodified.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passed_through: Vec<String>,
}
