//! `tenderlens validate`: plausibility checks on one extracted record.

use std::path::PathBuf;

use tenderlens_recon::model::{ConfidenceLevel, ValidationOutcome, ValidationStatus};
use tenderlens_recon::Engine;

use crate::config::load_config;
use crate::exit_codes::EXIT_FINDINGS;
use crate::util::{emit_json, read_input};
use crate::CliError;

pub struct ValidateArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub unit_meal_cost: Option<f64>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub raw: bool,
}

pub fn cmd_validate(args: ValidateArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref(), args.unit_meal_cost)?;
    let engine = Engine::new(config).map_err(CliError::engine)?;

    let text = read_input(&args.input)?;
    tracing::debug!("read {} bytes from {}", text.len(), args.input.display());

    let outcome = if args.raw {
        engine.validate_response(&text).map_err(CliError::engine)?
    } else {
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| {
                CliError::parse(format!("input is not valid JSON: {e}"))
                    .with_hint("pass --raw if the input is a model response with surrounding text")
            })?;
        engine.validate_value(&value)
    };

    emit_json(&outcome, args.json, args.output.as_deref())?;
    print_summary(&outcome);

    let errors = outcome.summary.by_severity.error;
    if args.strict && errors > 0 {
        return Err(CliError::new(
            EXIT_FINDINGS,
            format!("{errors} error finding(s) (--strict)"),
        ));
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(outcome: &ValidationOutcome) {
    let s = &outcome.summary;
    eprintln!(
        "validation {}: {} warnings ({} error, {} warning, {} info), {} auto-fixed, \
         confidence {:.2} ({})",
        status_label(s.status),
        s.total_warnings,
        s.by_severity.error,
        s.by_severity.warning,
        s.by_severity.info,
        outcome.fix_count,
        s.confidence.overall,
        level_label(s.confidence.level),
    );

    for w in &outcome.warnings {
        let fixed = if w.auto_fixed { " (fixed)" } else { "" };
        eprintln!("  [{}] {}{fixed}: {}", w.severity, w.field, w.message);
    }
}

fn status_label(status: ValidationStatus) -> &'static str {
    match status {
        ValidationStatus::Valid => "valid",
        ValidationStatus::Warning => "passed with warnings",
        ValidationStatus::Error => "failed",
    }
}

fn level_label(level: ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::High => "high",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::Low => "low",
    }
}
