//! `tenderlens-recon`: validation and reconciliation engine for values
//! extracted from procurement documents.
//!
//! Pure engine crate: receives already-extracted records and entity
//! collections, returns corrected records with warnings and merged
//! collections. No CLI or IO dependencies.

pub mod anomaly;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod reconcile;
pub mod rules;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use model::{
    EquipmentCategory, ExtractedRecord, Field, Organization, PersonnelPosition, ReconcileReport,
    Severity, TableIntelligence, ValidationOutcome, ValidationWarning,
};
pub use normalize::normalize;
pub use reconcile::{
    reconcile_equipment, reconcile_intelligence, reconcile_intelligence_value,
    reconcile_organizations, reconcile_personnel,
};
