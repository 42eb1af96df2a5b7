//! Protocol validation
//!
//! Request-level grammar checks, run before any argument is bound. The
//! checks run in a fixed order and the first violation wins:
//!
//! 1. method name present → else invalid request
//! 2. params is an array or object → else parse error
//! 3. method known to the registry → else procedure not found
//! 4. no more params than declared arguments → else invalid params
//! 5. (2.0 only) params are all positional or all named → else invalid params
//! 6. every key is a valid index or a declared name → else invalid params
//!
//! JSON-RPC 1.1 permits mixing positional and named keys; overlaps are
//! caught later by the binder.

use crate::registry::{CallContext, MethodRegistry};
use duorpc_core::{Error, MethodDescriptor, ParamKey, Params, Request, Result};
use serde_json::json;

/// Validate a request and resolve its method descriptor
pub fn validate(
    request: &Request,
    registry: &dyn MethodRegistry,
    context: &CallContext,
) -> Result<MethodDescriptor> {
    if request.method().is_empty() {
        return Err(Error::InvalidRequest(
            "The received JSON is not a valid JSON-RPC Request".to_string(),
        ));
    }

    let params = request.params().ok_or_else(|| {
        Error::Parse("The params member must be an array or an object".to_string())
    })?;

    let descriptor = registry
        .lookup(request.method(), context)
        .ok_or_else(|| Error::ProcedureNotFound(request.method().to_string()))?;

    check_count(&descriptor, params)?;

    if request.version().is_v2() {
        check_not_mixed(params)?;
    }

    check_keys(&descriptor, params)?;

    Ok(descriptor)
}

fn check_count(descriptor: &MethodDescriptor, params: &Params) -> Result<()> {
    let declared = descriptor.argument_count();
    let supplied = params.len();
    if supplied <= declared {
        return Ok(());
    }

    let message = match declared {
        0 => format!(
            "The method {} does not take any arguments, {} given",
            descriptor.name, supplied
        ),
        1 => format!(
            "The method {} takes 1 argument, {} given",
            descriptor.name, supplied
        ),
        n => format!(
            "The method {} takes {} arguments, {} given",
            descriptor.name, n, supplied
        ),
    };

    Err(Error::invalid_params_with_data(
        message,
        json!({"declared": declared, "supplied": supplied}),
    ))
}

/// The first key decides whether the call is positional or named
fn check_not_mixed(params: &Params) -> Result<()> {
    let mut positional: Option<bool> = None;

    for (key, _) in params.iter() {
        match positional {
            None => positional = Some(key.is_positional()),
            Some(kind) if kind != key.is_positional() => {
                return Err(Error::invalid_params_with_data(
                    "Positional and named parameters cannot be mixed in a JSON-RPC 2.0 call",
                    json!({"parameter": key.to_string()}),
                ));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

fn check_keys(descriptor: &MethodDescriptor, params: &Params) -> Result<()> {
    let declared = descriptor.argument_count();

    for (key, value) in params.iter() {
        let known = match key {
            ParamKey::Index(index) => index < declared,
            ParamKey::Name(name) => descriptor.position_of(name).is_some(),
        };

        if !known {
            return Err(Error::invalid_params_with_data(
                format!(
                    "Invalid parameter {} for method {}: {}",
                    key, descriptor.name, value
                ),
                json!({"parameter": key.to_string(), "value": value}),
            ));
        }
    }

    Ok(())
}
