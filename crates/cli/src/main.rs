// tenderlens CLI - validate and reconcile tender extraction output

mod config;
mod exit_codes;
mod reconcile;
mod util;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use exit_codes::{engine_exit_code, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "tenderlens")]
#[command(about = "Validate and reconcile values extracted from tender documents")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one extracted record: plausibility checks, auto-fixes, summary
    #[command(after_help = "\
Examples:
  tenderlens validate record.json --unit-meal-cost 85
  tenderlens validate record.json --config engine.toml --json
  cat response.txt | tenderlens validate - --raw --strict")]
    Validate {
        /// Path to the extracted record JSON, or `-` for stdin
        input: PathBuf,

        /// Engine config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Cost of one meal, used to derive a missing budget (overrides the config file)
        #[arg(long, env = "TENDERLENS_UNIT_MEAL_COST")]
        unit_meal_cost: Option<f64>,

        /// Output JSON to stdout instead of the human summary only
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit with a non-zero code when any finding has `error` severity
        #[arg(long)]
        strict: bool,

        /// Treat the input as a raw model response and extract the JSON object from it
        #[arg(long)]
        raw: bool,
    },

    /// Merge duplicate organizations, equipment and personnel roles
    #[command(after_help = "\
Examples:
  tenderlens reconcile intelligence.json
  tenderlens reconcile intelligence.json --json --output merged.json")]
    Reconcile {
        /// Path to the table-intelligence JSON, or `-` for stdin
        input: PathBuf,

        /// Output JSON to stdout instead of the human summary only
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Treat the input as a raw model response and extract the JSON object from it
        #[arg(long)]
        raw: bool,
    },

    /// Engine config commands
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            input,
            config,
            unit_meal_cost,
            json,
            output,
            strict,
            raw,
        } => validate::cmd_validate(validate::ValidateArgs {
            input,
            config,
            unit_meal_cost,
            json,
            output,
            strict,
            raw,
        }),
        Commands::Reconcile { input, json, output, raw } => {
            reconcile::cmd_reconcile(input, json, output, raw)
        }
        Commands::Config(cmd) => config::cmd_config(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PARSE, msg)
    }

    /// Create error from an engine error with the matching exit code.
    pub fn engine(err: tenderlens_recon::EngineError) -> Self {
        let code = engine_exit_code(&err);
        let hint = match &err {
            tenderlens_recon::EngineError::NoJsonObject => {
                Some("the response has no `{ ... }` block; check the model output".to_string())
            }
            tenderlens_recon::EngineError::ConfigParse(_) => {
                Some("run `tenderlens config check <file>` to see the accepted keys".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
