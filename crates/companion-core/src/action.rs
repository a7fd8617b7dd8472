//! Wire representation of one Tasker action step

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Primitive value held by an argument slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ArgValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ArgValue {
    /// String view, only for string slots
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(n) => Some(*n),
            ArgValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    /// Numeric zero, as opposed to an empty string or `false`
    pub fn is_numeric_zero(&self) -> bool {
        match self {
            ArgValue::Int(n) => *n == 0,
            ArgValue::Float(f) => *f == 0.0,
            _ => false,
        }
    }

    /// Whether the value counts as "set" for form defaults.
    /// Null, `false`, zero and the empty string are all unset.
    pub fn is_truthy(&self) -> bool {
        match self {
            ArgValue::Null => false,
            ArgValue::Bool(b) => *b,
            ArgValue::Int(n) => *n != 0,
            ArgValue::Float(f) => *f != 0.0 && !f.is_nan(),
            ArgValue::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => Ok(()),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(n) => write!(f, "{}", n),
            ArgValue::Float(v) => write!(f, "{}", v),
            ArgValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

/// One stably identified argument of an action.
///
/// `id` is assigned by the server and is not a position: slot lists may be
/// sparse or reordered, so lookups always scan for the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSlot {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: ArgValue,
}

impl ArgSlot {
    pub fn new(id: i64, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        Self {
            id,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Condition attached to an action; opaque to this client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(pub JsonValue);

/// A single automation step as the Tasker server stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenericAction {
    pub code: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: Vec<ArgSlot>,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "condition")]
    pub conditions: Vec<Condition>,
    #[serde(default, rename = "continueTaskOnError")]
    pub continue_on_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_properties: Option<JsonValue>,
    /// Position in the remote list; assigned client side from the list order
    #[serde(default)]
    pub index: usize,
}

impl GenericAction {
    pub fn new(code: i64, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Vec<ArgSlot>) -> Self {
        self.args = args;
        self
    }

    pub fn slot(&self, id: i64) -> Option<&ArgSlot> {
        self.args.iter().find(|arg| arg.id == id)
    }

    pub fn slot_mut(&mut self, id: i64) -> Option<&mut ArgSlot> {
        self.args.iter_mut().find(|arg| arg.id == id)
    }

    /// Whether this action carries the given server code and name
    pub fn is(&self, code: i64, name: &str) -> bool {
        self.code == code && self.name == name
    }
}
