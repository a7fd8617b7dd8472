//! Typed view over a generic action

use crate::context::ResolveContext;
use crate::descriptor::ActionTypeDescriptor;
use crate::mapper::ParameterMapper;
use crate::types::{GenericParams, HomeAssistantParams, HttpRequestParams, PopupParams};
use companion_core::GenericAction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How an action type came to handle an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportKind {
    /// Fallback editor over the raw slots
    Default,
    /// Dedicated editor for one server action
    Custom,
    /// Alternative presentation of an action another type already handles
    Plugin,
}

/// A concrete action type: static metadata plus its parameter mapping
pub trait ActionKind: ParameterMapper + Into<ActionParams> {
    const ID: &'static str;
    const NAME: &'static str;
    const SUPPORT: SupportKind;
    const SHOW_ARGS: bool = true;

    /// Whether this type can present the given action
    fn recognizes(&self, action: &GenericAction, ctx: &ResolveContext) -> bool;

    /// Short human readable summary
    fn describe(&self) -> String {
        String::new()
    }

    /// Fresh action to start from when creating a new action of this type
    fn template() -> Option<GenericAction> {
        None
    }
}

/// Decoded parameters, one variant per known action type
#[derive(Debug, Clone, PartialEq)]
pub enum ActionParams {
    Popup(PopupParams),
    HttpRequest(HttpRequestParams),
    HomeAssistant(HomeAssistantParams),
    Generic(GenericParams),
}

impl ActionParams {
    fn recognizes(&self, action: &GenericAction, ctx: &ResolveContext) -> bool {
        match self {
            ActionParams::Popup(p) => p.recognizes(action, ctx),
            ActionParams::HttpRequest(p) => p.recognizes(action, ctx),
            ActionParams::HomeAssistant(p) => p.recognizes(action, ctx),
            ActionParams::Generic(p) => p.recognizes(action, ctx),
        }
    }

    fn encode(&mut self, action: &mut GenericAction, ctx: &ResolveContext) {
        match self {
            ActionParams::Popup(p) => p.encode(action, ctx),
            ActionParams::HttpRequest(p) => p.encode(action, ctx),
            ActionParams::HomeAssistant(p) => p.encode(action, ctx),
            ActionParams::Generic(p) => p.encode(action, ctx),
        }
    }

    fn describe(&self) -> String {
        match self {
            ActionParams::Popup(p) => p.describe(),
            ActionParams::HttpRequest(p) => p.describe(),
            ActionParams::HomeAssistant(p) => p.describe(),
            ActionParams::Generic(p) => p.describe(),
        }
    }
}

macro_rules! impl_into_params {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for ActionParams {
            fn from(params: $ty) -> Self {
                ActionParams::$variant(params)
            }
        })*
    };
}

impl_into_params!(
    PopupParams => Popup,
    HttpRequestParams => HttpRequest,
    HomeAssistantParams => HomeAssistant,
    GenericParams => Generic,
);

/// One action wrapped by the type that recognized it.
///
/// The wrapped action is owned; editing the typed parameters and calling
/// [`ActionType::encode`] writes them back into its slots.
#[derive(Debug, Clone)]
pub struct ActionType {
    descriptor: ActionTypeDescriptor,
    action: GenericAction,
    params: ActionParams,
    description: String,
    plugins: Vec<ActionType>,
    context: Arc<ResolveContext>,
}

impl ActionType {
    pub(crate) fn new(
        descriptor: ActionTypeDescriptor,
        action: GenericAction,
        params: ActionParams,
        context: Arc<ResolveContext>,
    ) -> Self {
        Self {
            descriptor,
            action,
            params,
            description: String::new(),
            plugins: Vec::new(),
            context,
        }
    }

    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn support(&self) -> SupportKind {
        self.descriptor.support
    }

    pub fn show_args(&self) -> bool {
        self.descriptor.show_args
    }

    pub fn descriptor(&self) -> &ActionTypeDescriptor {
        &self.descriptor
    }

    pub fn action(&self) -> &GenericAction {
        &self.action
    }

    pub fn into_action(self) -> GenericAction {
        self.action
    }

    pub fn params(&self) -> &ActionParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ActionParams {
        &mut self.params
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Position of the wrapped action in the remote list
    pub fn index(&self) -> usize {
        self.action.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.action.index = index;
    }

    pub fn label(&self) -> &str {
        &self.action.label
    }

    /// Empty labels are rejected and leave the current one in place
    pub fn set_label(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label.is_empty() {
            return false;
        }
        self.action.label = label;
        true
    }

    pub fn set_continue_on_error(&mut self, value: bool) {
        self.action.continue_on_error = value;
    }

    /// Plugin types that also recognized this action
    pub fn plugins(&self) -> &[ActionType] {
        &self.plugins
    }

    pub(crate) fn set_plugins(&mut self, plugins: Vec<ActionType>) {
        self.plugins = plugins;
    }

    /// Switch to the presentation offered by one of the attached plugins
    pub fn into_plugin(self, plugin_id: &str) -> Option<ActionType> {
        self.plugins.into_iter().find(|p| p.id() == plugin_id)
    }

    /// Run the recognition predicate; on a match the description is refreshed
    pub fn can_handle(&mut self) -> bool {
        let handled = self.params.recognizes(&self.action, &self.context);
        if handled {
            self.description = self.params.describe();
        }
        handled
    }

    /// Write the typed parameters back into the wrapped action's slots
    pub fn encode(&mut self) {
        self.params.encode(&mut self.action, &self.context);
        self.description = self.params.describe();
    }
}
