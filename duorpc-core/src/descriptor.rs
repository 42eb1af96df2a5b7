//! Method descriptors and bound arguments
//!
//! A [`MethodDescriptor`] is the registry's declaration of a callable: its
//! name and ordered, typed argument list. The argument order defines which
//! positional index binds to which argument. [`BoundArguments`] is the
//! binder's output, exactly one value per declared argument.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared type of an argument
///
/// Type enforcement at this layer is shallow: only numeric types, `array`
/// and `struct` influence validation. Unknown type names are kept in
/// [`ArgType::Other`] and accept any value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArgType {
    Int,
    Float,
    String,
    Bool,
    Array,
    Struct,
    Any,
    Other(String),
}

impl ArgType {
    pub fn as_str(&self) -> &str {
        match self {
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::String => "string",
            ArgType::Bool => "bool",
            ArgType::Array => "array",
            ArgType::Struct => "struct",
            ArgType::Any => "any",
            ArgType::Other(name) => name,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ArgType::Int | ArgType::Float)
    }
}

impl From<String> for ArgType {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => ArgType::Int,
            "float" | "double" | "number" => ArgType::Float,
            "string" => ArgType::String,
            "bool" | "boolean" => ArgType::Bool,
            "array" => ArgType::Array,
            "struct" | "object" => ArgType::Struct,
            "any" | "mixed" => ArgType::Any,
            _ => ArgType::Other(name),
        }
    }
}

impl From<&str> for ArgType {
    fn from(name: &str) -> Self {
        ArgType::from(name.to_string())
    }
}

impl From<ArgType> for String {
    fn from(ty: ArgType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ArgType,
    #[serde(default)]
    pub optional: bool,
    /// Value bound when an optional argument is not supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ArgumentSpec {
    /// Required argument
    pub fn required(name: impl Into<String>, ty: impl Into<ArgType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            optional: false,
            default: None,
        }
    }

    /// Optional argument, bound to `default` (or `null`) when not supplied
    pub fn optional(name: impl Into<String>, ty: impl Into<ArgType>, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            optional: true,
            default,
        }
    }
}

/// Declared signature of a method
///
/// # Examples
///
/// ```rust
/// use duorpc_core::{ArgType, ArgumentSpec, MethodDescriptor};
/// use serde_json::json;
///
/// let descriptor = MethodDescriptor::new("user.save")
///     .arg(ArgumentSpec::required("account", ArgType::Struct))
///     .arg(ArgumentSpec::optional("notify", "bool", Some(json!(true))));
///
/// assert_eq!(descriptor.argument_count(), 2);
/// assert_eq!(descriptor.position_of("notify"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// Position of the argument with the given name
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.arguments.iter().position(|arg| arg.name == name)
    }
}

/// Arguments bound to a descriptor, in declaration order
///
/// Once binding succeeds, `len()` equals the descriptor's argument count.
/// Optional arguments that were not supplied hold their default, or `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments(Vec<Value>);

impl BoundArguments {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserialize the argument at `index` into a concrete type
    ///
    /// A missing argument deserializes from `null`, which suits `Option<T>`.
    /// Conversion failures are reported as invalid params.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.0.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| Error::invalid_params(format!("Argument {}: {}", index, e)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for BoundArguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl IntoIterator for BoundArguments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arg_type_aliases() {
        assert_eq!(ArgType::from("integer"), ArgType::Int);
        assert_eq!(ArgType::from("Double"), ArgType::Float);
        assert_eq!(ArgType::from("object"), ArgType::Struct);
        assert_eq!(ArgType::from("mixed"), ArgType::Any);
        assert_eq!(ArgType::from("uuid"), ArgType::Other("uuid".into()));
        assert!(ArgType::Int.is_numeric());
        assert!(!ArgType::String.is_numeric());
    }

    #[test]
    fn test_descriptor_deserialize() {
        let descriptor: MethodDescriptor = serde_json::from_value(json!({
            "name": "node.save",
            "arguments": [
                {"name": "node", "type": "struct"},
                {"name": "revision", "type": "int", "optional": true, "default": 0}
            ]
        }))
        .unwrap();

        assert_eq!(descriptor.arguments[0], ArgumentSpec::required("node", ArgType::Struct));
        assert_eq!(
            descriptor.arguments[1],
            ArgumentSpec::optional("revision", ArgType::Int, Some(json!(0)))
        );
    }

    #[test]
    fn test_descriptor_serialize_type_name() {
        let spec = ArgumentSpec::required("count", ArgType::Int);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "int");
        assert!(value.get("default").is_none());
    }

    #[test]
    fn test_bound_arguments_parse() {
        let args = BoundArguments::from(vec![json!(5), json!({"a": 1}), Value::Null]);

        assert_eq!(args.parse::<i64>(0).unwrap(), 5);
        assert_eq!(args.parse::<Option<String>>(2).unwrap(), None);
        assert_eq!(args.parse::<Option<String>>(9).unwrap(), None);

        let err = args.parse::<i64>(1).unwrap_err();
        assert_eq!(err.code(), -32602);
    }
}
