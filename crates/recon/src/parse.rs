//! Strict boundary between raw extraction output and the typed model.
//!
//! Everything past these functions is strongly typed. Shapes are checked once
//! here; a value that does not fit is an `EngineError`, never a guess.

use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};

use crate::error::EngineError;
use crate::model::{ExtractedRecord, TableIntelligence};

/// Largest float that still converts to an exact integer count.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Deserialize an optional integer count.
///
/// Accepts `null`, JSON integers, and floats with no fractional part
/// (models often emit `120.0`). Strings, fractions and booleans are rejected.
pub(crate) fn de_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer count or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(CountVisitor)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_FLOAT {
                Ok(Some(v as i64))
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }
    }

    deserializer.deserialize_option(CountVisitor)
}

/// Locate the outermost `{ ... }` in a model response.
///
/// Models wrap JSON in prose or markdown fences; this returns the slice from
/// the first `{` to the last `}` inclusive.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a JSON document into an `ExtractedRecord`.
pub fn parse_record(json: &str) -> Result<ExtractedRecord, EngineError> {
    serde_json::from_str(json).map_err(|e| EngineError::RecordParse(e.to_string()))
}

/// Parse a raw model response (JSON possibly surrounded by text).
pub fn parse_record_response(text: &str) -> Result<ExtractedRecord, EngineError> {
    let json = extract_json_object(text).ok_or(EngineError::NoJsonObject)?;
    parse_record(json)
}

pub fn parse_intelligence(json: &str) -> Result<TableIntelligence, EngineError> {
    serde_json::from_str(json).map_err(|e| EngineError::IntelligenceParse(e.to_string()))
}

pub fn parse_intelligence_response(text: &str) -> Result<TableIntelligence, EngineError> {
    let json = extract_json_object(text).ok_or(EngineError::NoJsonObject)?;
    parse_intelligence(json)
}
