//! Server-declared action schema (action specs, category specs, variables)

use crate::action::{ArgSlot, ArgValue, GenericAction};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Primitive type of an argument slot as declared by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "String")]
pub enum PrimitiveType {
    String,
    Int,
    Boolean,
    /// Any declaration this client does not understand; treated like a string
    Other,
}

impl PrimitiveType {
    /// Zero value used to pre-populate a fresh slot of this type
    pub fn zero_value(self) -> ArgValue {
        match self {
            PrimitiveType::String | PrimitiveType::Other => ArgValue::Str(String::new()),
            PrimitiveType::Int => ArgValue::Int(0),
            PrimitiveType::Boolean => ArgValue::Bool(false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::String => "STRING",
            PrimitiveType::Int => "INT",
            PrimitiveType::Boolean => "BOOLEAN",
            PrimitiveType::Other => "OTHER",
        }
    }
}

impl From<JsonValue> for PrimitiveType {
    fn from(value: JsonValue) -> Self {
        let Some(name) = value.as_str() else {
            return PrimitiveType::Other;
        };
        match name.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => PrimitiveType::String,
            "int" | "integer" | "number" => PrimitiveType::Int,
            "boolean" | "bool" => PrimitiveType::Boolean,
            _ => PrimitiveType::Other,
        }
    }
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionArgSpec {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub primitive_type: PrimitiveType,
    #[serde(default, rename = "isMandatory")]
    pub mandatory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
    #[serde(default)]
    pub category_code: i64,
    pub code: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub can_fail: bool,
    #[serde(default)]
    pub args: Vec<ActionArgSpec>,
}

impl ActionSpec {
    /// Materialize a new action with one zero-valued slot per declared argument
    pub fn create_action(&self) -> GenericAction {
        let args = self
            .args
            .iter()
            .map(|arg| ArgSlot {
                id: arg.id,
                name: arg.name.clone(),
                value: arg.primitive_type.zero_value(),
            })
            .collect();

        GenericAction::new(self.code, self.name.clone()).with_args(args)
    }

    pub fn arg(&self, id: i64) -> Option<&ActionArgSpec> {
        self.args.iter().find(|arg| arg.id == id)
    }
}

/// Grouping metadata for action specs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub code: i64,
    #[serde(default)]
    pub name: String,
}

/// A Tasker variable visible to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}
