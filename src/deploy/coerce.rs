//! Raw text to typed JSON parameter values.

use serde_json::{Map, Number, Value};
use tracing::debug;

use super::schema::{ParamType, ParameterSpec, StackSchema};
use crate::error::DeployError;

/// Coerce `raw` against `spec`.
///
/// Empty or absent input yields the default unchanged, whatever its JSON type.
/// `number` tries an integer parse, then a float parse; a float with no
/// fractional part becomes an integer when the default is an integer.
pub fn coerce(spec: &ParameterSpec, raw: Option<&str>) -> Result<Value, DeployError> {
    let raw = match raw {
        Some(text) if !text.is_empty() => text,
        _ => {
            return spec
                .default
                .clone()
                .ok_or_else(|| DeployError::MissingRequiredValue(spec.name.clone()));
        }
    };

    match spec.param_type {
        ParamType::Number => coerce_number(spec, raw),
        ParamType::String | ParamType::Secret | ParamType::Unspecified => {
            Ok(Value::String(raw.to_string()))
        }
    }
}

fn coerce_number(spec: &ParameterSpec, raw: &str) -> Result<Value, DeployError> {
    let invalid = || DeployError::InvalidNumber {
        name: spec.name.clone(),
        raw: raw.to_string(),
    };
    let text = raw.trim();

    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::from(int));
    }

    let float = text
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(invalid)?;

    let int_default = spec.default.as_ref().is_some_and(is_integer);
    if int_default && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        return Ok(Value::from(float as i64));
    }

    Number::from_f64(float).map(Value::Number).ok_or_else(invalid)
}

fn is_integer(value: &Value) -> bool {
    value.as_i64().is_some() || value.as_u64().is_some()
}

/// Validation predicate used by the prompt layer: input may only be empty
/// when the parameter has a default.
pub fn accepts_empty(spec: &ParameterSpec) -> bool {
    spec.default.is_some()
}

/// Split a `key=value` override on its first `=`.
pub fn parse_override(raw: &str) -> Result<(&str, &str), DeployError> {
    raw.split_once('=')
        .ok_or_else(|| DeployError::MalformedOverride(raw.to_string()))
}

/// Coerce `--param key=value` overrides against the schema.
///
/// Keys the schema does not declare take the string path. When a key repeats,
/// the last occurrence wins.
pub fn coerce_overrides(
    schema: &StackSchema,
    overrides: &[String],
) -> Result<Map<String, Value>, DeployError> {
    let mut coerced = Map::new();

    for raw in overrides {
        let (key, value) = parse_override(raw)?;
        let spec = match schema.parameter(key) {
            Some(spec) => spec.clone(),
            None => {
                debug!(key, "override for undeclared parameter, treating as string");
                ParameterSpec::new(key, ParamType::Unspecified, None)
            }
        };
        let typed = coerce(&spec, Some(value))?;
        coerced.insert(key.to_string(), typed);
    }

    Ok(coerced)
}
