use thiserror::Error;

/// Failures the engine reports as `Err`.
///
/// Data-quality problems in extracted values are never errors; they surface as
/// `ValidationWarning`s. Only configuration problems and strict-boundary parse
/// failures end up here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config value out of range.
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Extraction output did not match the record shape.
    #[error("cannot parse extracted record: {0}")]
    RecordParse(String),
    /// Table-intelligence output did not match the expected shape.
    #[error("cannot parse table intelligence: {0}")]
    IntelligenceParse(String),
    /// Raw model response contained no `{ ... }` object at all.
    #[error("response contains no JSON object")]
    NoJsonObject,
}
