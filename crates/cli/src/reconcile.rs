//! `tenderlens reconcile`: merge duplicate entities in table-intelligence output.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tenderlens_recon::parse::extract_json_object;
use tenderlens_recon::{reconcile_intelligence_value, EngineError, ReconcileReport};

use crate::util::{emit_json, read_input};
use crate::CliError;

#[derive(Serialize)]
struct ReconcileOutput {
    intelligence: Value,
    report: ReconcileReport,
}

pub fn cmd_reconcile(
    input: PathBuf,
    json: bool,
    output: Option<PathBuf>,
    raw: bool,
) -> Result<(), CliError> {
    let text = read_input(&input)?;

    let json_text = if raw {
        extract_json_object(&text).ok_or_else(|| CliError::engine(EngineError::NoJsonObject))?
    } else {
        text.as_str()
    };

    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        CliError::engine(EngineError::IntelligenceParse(e.to_string()))
            .with_hint("pass --raw if the input is a model response with surrounding text")
    })?;

    let (intelligence, report) = reconcile_intelligence_value(value);

    let result = ReconcileOutput { intelligence, report };
    emit_json(&result, json, output.as_deref())?;

    let r = &result.report;
    eprintln!(
        "reconcile: organizations {} -> {}, equipment products {} -> {}, personnel roles {} -> {} \
         ({} duplicates merged)",
        r.organizations.before,
        r.organizations.after,
        r.equipment_products.before,
        r.equipment_products.after,
        r.personnel.before,
        r.personnel.after,
        r.duplicates_merged,
    );
    if !r.passed_through.is_empty() {
        eprintln!("passed through unmodified: {}", r.passed_through.join(", "));
    }

    Ok(())
}
