//! Engine commands and free-form parameter maps
//!
//! Every entity ends up as one or more [`Command`]s: a command kind followed by a
//! flat list of scalar arguments. Free-form entity parameters are carried in an
//! ordered [`Params`] map and flattened with a single rule: keys starting with
//! `-` are optional flags, every other key is mandatory.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix that marks a parameter key as an optional flag
pub const FLAG_PREFIX: char = '-';

/// A single scalar engine argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Arg {
    /// Numeric value of the argument, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Str(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

macro_rules! arg_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(value: $t) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

arg_from_int!(i32, u32, u8, i64);

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// One command for the external engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command kind, e.g. `node`, `element`, `pattern`
    pub kind: String,
    /// Flat, ordered argument list
    pub args: Vec<Arg>,
}

impl Command {
    /// Create a command with no arguments
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append every argument from an iterator
    pub fn args<T: Into<Arg>>(mut self, args: impl IntoIterator<Item = T>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `-name value` when the value is present
    pub fn flag_opt<T: Into<Arg>>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.arg(name).arg(value),
            None => self,
        }
    }

    /// Numeric view of the arguments, skipping string tokens
    pub fn numbers(&self) -> Vec<f64> {
        self.args.iter().filter_map(Arg::as_f64).collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Ordered free-form parameter map
///
/// Iteration order is insertion order, so the flattened argument list follows
/// the order in which parameters were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Flatten into an engine argument list
    ///
    /// Flag keys (leading `-`) emit the key, then the value only when it is
    /// present and non-empty. Other keys emit their value and fail when it is
    /// absent. List values are spliced in place.
    pub fn flatten(&self) -> BuildResult<Vec<Arg>> {
        let mut out = Vec::new();
        for (key, value) in &self.0 {
            if key.starts_with(FLAG_PREFIX) {
                out.push(Arg::Str(key.clone()));
                if !is_empty_value(value) {
                    push_value(key, value, &mut out)?;
                }
            } else {
                if is_empty_value(value) {
                    return Err(BuildError::MissingArgument { key: key.clone() });
                }
                push_value(key, value, &mut out)?;
            }
        }
        Ok(out)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Params {
    type Error = BuildError;

    fn try_from(value: Value) -> BuildResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(BuildError::invalid(format!(
                "parameter map must be an object, got {other}"
            ))),
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn push_value(key: &str, value: &Value, out: &mut Vec<Arg>) -> BuildResult<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                out.push(scalar(key, item)?);
            }
        }
        other => out.push(scalar(key, other)?),
    }
    Ok(())
}

fn scalar(key: &str, value: &Value) -> BuildResult<Arg> {
    match value {
        Value::Bool(b) => Ok(Arg::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(Arg::Int)
            .or_else(|| n.as_f64().map(Arg::Float))
            .ok_or_else(|| BuildError::invalid(format!("'{key}' is not a representable number"))),
        Value::String(s) => Ok(Arg::Str(s.clone())),
        Value::Null => Err(BuildError::MissingArgument {
            key: key.to_string(),
        }),
        Value::Array(_) | Value::Object(_) => Err(BuildError::invalid(format!(
            "'{key}' must hold scalars or a flat list"
        ))),
    }
}
