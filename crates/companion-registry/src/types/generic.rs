use crate::action_type::{ActionKind, SupportKind};
use crate::context::ResolveContext;
use crate::mapper::{write_slot, ParameterMapper};
use companion_core::{ActionSpec, ArgValue, GenericAction, PrimitiveType};
use std::collections::BTreeMap;

/// Raw slot values keyed by slot id; handles any action no other type claims
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericParams {
    pub values: BTreeMap<i64, ArgValue>,
}

impl GenericParams {
    /// Give every argument the spec declares a value, using the zero value of
    /// its declared type when the slot is missing or unset.
    ///
    /// Arguments of an unknown type are left null rather than guessed at.
    pub fn fill_from_spec(&mut self, spec: &ActionSpec) {
        for arg in &spec.args {
            let entry = self.values.entry(arg.id).or_default();
            if !entry.is_truthy() {
                *entry = match arg.primitive_type {
                    PrimitiveType::Other => ArgValue::Null,
                    known => known.zero_value(),
                };
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&ArgValue> {
        self.values.get(&id)
    }

    pub fn set(&mut self, id: i64, value: impl Into<ArgValue>) {
        self.values.insert(id, value.into());
    }
}

impl ParameterMapper for GenericParams {
    fn decode(action: &GenericAction, _ctx: &ResolveContext) -> Self {
        Self {
            values: action
                .args
                .iter()
                .map(|slot| (slot.id, slot.value.clone()))
                .collect(),
        }
    }

    fn encode(&mut self, action: &mut GenericAction, _ctx: &ResolveContext) {
        for (id, value) in &self.values {
            write_slot(action, *id, value.clone());
        }
    }
}

impl ActionKind for GenericParams {
    const ID: &'static str = "default";
    const NAME: &'static str = "Default";
    const SUPPORT: SupportKind = SupportKind::Default;

    fn recognizes(&self, _action: &GenericAction, _ctx: &ResolveContext) -> bool {
        true
    }
}
