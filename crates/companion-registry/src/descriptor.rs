use crate::action_type::{ActionKind, ActionParams, ActionType, SupportKind};
use crate::context::ResolveContext;
use companion_core::GenericAction;
use std::fmt;
use std::sync::Arc;

type ParamsConstructor = fn(&GenericAction, &ResolveContext) -> ActionParams;

/// Registration entry for one action type
#[derive(Clone, Copy)]
pub struct ActionTypeDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub support: SupportKind,
    pub show_args: bool,
    construct: ParamsConstructor,
    template: fn() -> Option<GenericAction>,
}

impl ActionTypeDescriptor {
    pub fn of<K: ActionKind>() -> Self {
        Self {
            id: K::ID,
            name: K::NAME,
            support: K::SUPPORT,
            show_args: K::SHOW_ARGS,
            construct: construct_params::<K>,
            template: K::template,
        }
    }

    /// Decode the action's parameters and wrap it, without checking recognition
    pub fn instantiate(&self, action: GenericAction, context: Arc<ResolveContext>) -> ActionType {
        let params = (self.construct)(&action, &context);
        ActionType::new(*self, action, params, context)
    }

    pub fn template(&self) -> Option<GenericAction> {
        (self.template)()
    }
}

fn construct_params<K: ActionKind>(action: &GenericAction, ctx: &ResolveContext) -> ActionParams {
    K::decode(action, ctx).into()
}

impl fmt::Debug for ActionTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTypeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("support", &self.support)
            .finish()
    }
}

impl PartialEq for ActionTypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
