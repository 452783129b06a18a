//! `tenderlens config` and engine-config loading shared by the commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tenderlens_recon::EngineConfig;

use crate::util::read_input;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate an engine config without running anything
    #[command(after_help = "\
Examples:
  tenderlens config check engine.toml")]
    Check {
        /// Path to the engine config (TOML)
        file: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Check { file } => cmd_config_check(&file),
    }
}

fn cmd_config_check(file: &Path) -> Result<(), CliError> {
    let config = load_config(Some(file), None)?;

    let cost = config
        .unit_meal_cost
        .map_or_else(|| "not set (budgets will not be derived)".to_string(), |c| format!("{c} {}", config.currency));
    eprintln!("config ok: {}", file.display());
    eprintln!("  unit_meal_cost:        {cost}");
    eprintln!("  currency:              {}", config.currency);
    eprintln!("  anomaly_detection:     {}", config.anomaly_detection);
    eprintln!("  default_meals_per_day: {}", config.default_meals_per_day);
    Ok(())
}

/// Load the engine config from `path` (defaults when absent), then apply the
/// `--unit-meal-cost` override and validate the result.
pub(crate) fn load_config(
    path: Option<&Path>,
    unit_meal_cost: Option<f64>,
) -> Result<EngineConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = read_input(path)?;
            tracing::debug!("loaded engine config from {}", path.display());
            EngineConfig::from_toml(&text).map_err(CliError::engine)?
        }
        None => EngineConfig::default(),
    };

    if let Some(cost) = unit_meal_cost {
        config = config.with_unit_meal_cost(cost);
    }
    config.validate().map_err(CliError::engine)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO};
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn flag_overrides_file() {
        let f = toml_file("unit_meal_cost = 40.0\ncurrency = \"EUR\"\n");
        let config = load_config(Some(f.path()), Some(55.0)).unwrap();
        assert_eq!(config.unit_meal_cost, Some(55.0));
        assert_eq!(config.currency, "EUR");
    }

    #[test]
    fn invalid_override_is_config_error() {
        let err = load_config(None, Some(-1.0)).unwrap_err();
        assert_eq!(err.code, EXIT_INVALID_CONFIG);
    }

    #[test]
    fn unknown_key_is_config_error() {
        let f = toml_file("unit_cost = 40.0\n");
        let err = load_config(Some(f.path()), None).unwrap_err();
        assert_eq!(err.code, EXIT_INVALID_CONFIG);
        assert!(err.hint.is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/engine.toml")), None).unwrap_err();
        assert_eq!(err.code, EXIT_IO);
    }
}
