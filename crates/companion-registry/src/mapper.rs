//! Slot codec: moves values between positional argument slots and typed parameters.
//!
//! Slots are always located by their server-assigned id. Writes only touch
//! slots that already exist on the action; a missing slot is left missing.

use crate::context::ResolveContext;
use companion_core::{ArgValue, GenericAction};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Bidirectional mapping between an action's slots and a parameter struct
pub trait ParameterMapper: Sized {
    /// Read the parameters out of the action's slots
    fn decode(action: &GenericAction, ctx: &ResolveContext) -> Self;

    /// Write the parameters back into the action's slots.
    /// Takes `&mut self` because some parameter sets derive fields while encoding.
    fn encode(&mut self, action: &mut GenericAction, ctx: &ResolveContext);
}

/// One entry of a newline-delimited `key:value` list (headers, query parameters)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Entries with an empty key or value are dropped when encoding
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && self.value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

pub fn read_string(action: &GenericAction, id: i64) -> String {
    action
        .slot(id)
        .map(|slot| slot.value.to_string())
        .unwrap_or_default()
}

/// Like [`read_string`], but a numeric zero decodes to the empty string.
/// The server reports an unset URL slot as `0`.
pub fn read_url(action: &GenericAction, id: i64) -> String {
    match action.slot(id) {
        Some(slot) if slot.value.is_numeric_zero() => String::new(),
        _ => read_string(action, id),
    }
}

pub fn read_int(action: &GenericAction, id: i64) -> i64 {
    action
        .slot(id)
        .and_then(|slot| slot.value.as_int())
        .unwrap_or(0)
}

pub fn read_bool(action: &GenericAction, id: i64) -> bool {
    action
        .slot(id)
        .and_then(|slot| slot.value.as_bool())
        .unwrap_or(false)
}

pub fn write_slot(action: &mut GenericAction, id: i64, value: impl Into<ArgValue>) {
    if let Some(slot) = action.slot_mut(id) {
        slot.value = value.into();
    }
}

/// Split newline-delimited `key:value` text.
///
/// Each line is split once on the first `:`; a line without a colon yields an
/// entry with no value. Blank lines (such as the trailing newline written by
/// [`encode_pairs`]) are skipped.
pub fn decode_pairs(raw: &str) -> Vec<KeyValue> {
    raw.split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(':') {
            Some((key, value)) => KeyValue {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => KeyValue {
                key: line.to_string(),
                value: None,
            },
        })
        .collect()
}

/// Join complete entries as `key:value\n`
pub fn encode_pairs(pairs: &[KeyValue]) -> String {
    pairs
        .iter()
        .filter(|pair| pair.is_complete())
        .map(|pair| format!("{}:{}\n", pair.key, pair.value.as_deref().unwrap_or_default()))
        .collect()
}

/// Best-effort typing of a free-form value: text holding a non-empty JSON
/// array becomes that array, anything else stays the original string.
pub fn coerce_json_value(raw: &str) -> JsonValue {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(items)) if !items.is_empty() => JsonValue::Array(items),
        _ => JsonValue::String(raw.to_string()),
    }
}
