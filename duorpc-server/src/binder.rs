//! Parameter binding
//!
//! Turns the request's parameter container into [`BoundArguments`] ordered
//! like the descriptor's arguments. For each declared argument at position
//! `delta`:
//!
//! - (1.x only) supplying both `params[delta]` and `params[name]` is ambiguous
//! - a named value wins over a positional one
//! - a required argument must resolve to a value
//! - a resolved value is type-checked, a missing optional one gets its default
//!
//! Type checks are deliberately shallow. Deep validation of values is the
//! method implementation's job.

use duorpc_core::{
    ArgType, ArgumentSpec, BoundArguments, Error, MethodDescriptor, ParamKey, Request, Result,
};
use serde_json::{json, Map, Value};

/// Bind request params to a method descriptor
///
/// Expects a request that already passed [`crate::validate`]; a scalar
/// params member is still reported as a parse error.
pub fn bind(request: &Request, descriptor: &MethodDescriptor) -> Result<BoundArguments> {
    let params = request.params().ok_or_else(|| {
        Error::Parse("The params member must be an array or an object".to_string())
    })?;

    // 2.0 calls cannot mix styles, so overlap is impossible there
    let detect_overlap = !request.version().is_v2();

    let mut bound = BoundArguments::with_capacity(descriptor.argument_count());

    for (delta, arg) in descriptor.arguments.iter().enumerate() {
        let positional = params.by_index(delta);
        let named = params.by_name(&arg.name);

        if detect_overlap
            && positional.is_some()
            && named.is_some()
            && arg.name != delta.to_string()
        {
            return Err(Error::invalid_params_with_data(
                format!(
                    "Argument {} was supplied both at position {} and by name",
                    arg.name, delta
                ),
                json!({"argument": arg.name, "position": delta}),
            ));
        }

        match named.or(positional) {
            Some(value) => bound.push(check_type(arg, value)?),
            None if arg.optional => bound.push(arg.default.clone().unwrap_or(Value::Null)),
            None => {
                return Err(Error::invalid_params_with_data(
                    format!("Argument {} is required but was not received", arg.name),
                    json!({"argument": arg.name, "position": delta}),
                ));
            }
        }
    }

    tracing::trace!(method = %descriptor.name, bound = bound.len(), "Arguments bound");
    Ok(bound)
}

fn check_type(arg: &ArgumentSpec, value: &Value) -> Result<Value> {
    match value {
        Value::Object(_) | Value::Array(_) if arg.ty == ArgType::Struct => Ok(coerce_struct(value)),
        Value::Object(_) | Value::Array(_) if arg.ty != ArgType::Array => Err(wrong_type(arg, value)),
        _ if arg.ty.is_numeric() => check_numeric(arg, value),
        _ => Ok(value.clone()),
    }
}

/// Record-like containers become objects; anything with a numeric key is
/// passed through as received so no entry is dropped.
fn coerce_struct(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.is_empty() => Value::Object(Map::new()),
        Value::Object(map) if !map.keys().any(|k| ParamKey::classify(k).is_positional()) => {
            value.clone()
        }
        _ => {
            tracing::debug!("Keyed container bound to struct argument left unmodified");
            value.clone()
        }
    }
}

/// Numbers and numeric strings pass as supplied, everything else fails
fn check_numeric(arg: &ArgumentSpec, value: &Value) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) if is_numeric_text(s.trim()) => Ok(value.clone()),
        _ => Err(wrong_type(arg, value)),
    }
}

fn is_numeric_text(text: &str) -> bool {
    text.parse::<i128>().is_ok() || text.parse::<f64>().map_or(false, f64::is_finite)
}

fn wrong_type(arg: &ArgumentSpec, value: &Value) -> Error {
    let received = type_name(value);
    Error::invalid_params_with_data(
        format!(
            "Argument {} should be of type {}, {} given",
            arg.name, arg.ty, received
        ),
        json!({"argument": arg.name, "expected": arg.ty.as_str(), "received": received}),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "struct",
    }
}
