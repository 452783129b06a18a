//! CLI Exit Code Registry
//!
//! Single source of truth for all `tenderlens` exit codes. Exit codes are
//! part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, bad flag value)                |
//! | 3    | I/O error (cannot read input, cannot write output)        |
//! | 4    | Input does not parse as a record / table intelligence     |
//! | 5    | Invalid engine config                                     |
//! | 6    | Validation found `error` findings (only with `--strict`)  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid flag values.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read an input file / stdin, or cannot write `--output`.
pub const EXIT_IO: u8 = 3;

/// Input is not JSON of the expected shape, or a raw response holds no JSON object.
pub const EXIT_PARSE: u8 = 4;

/// Engine config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// `validate --strict` and at least one finding has `error` severity.
pub const EXIT_FINDINGS: u8 = 6;

use tenderlens_recon::EngineError;

/// Map an engine error to its exit code.
pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::ConfigParse(_) | EngineError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        EngineError::RecordParse(_)
        | EngineError::IntelligenceParse(_)
        | EngineError::NoJsonObject => EXIT_PARSE,
    }
}
