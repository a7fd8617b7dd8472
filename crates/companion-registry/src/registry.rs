//! Ordered registry of action types

use crate::action_type::{ActionParams, ActionType};
use crate::context::ResolveContext;
use crate::descriptor::ActionTypeDescriptor;
use crate::error::{RegistryError, RegistryResult};
use crate::types;
use companion_core::{Catalog, GenericAction};
use std::sync::Arc;

/// Resolves generic actions to the first action type that recognizes them.
///
/// Base types are tried in registration order; the first match wins. Every
/// plugin type that also recognizes the action is attached to the result.
#[derive(Debug, Clone)]
pub struct ActionTypeRegistry {
    context: Arc<ResolveContext>,
    base_types: Vec<ActionTypeDescriptor>,
    plugin_types: Vec<ActionTypeDescriptor>,
    loaded: bool,
}

impl ActionTypeRegistry {
    /// Empty registry; call [`load_types`](Self::load_types) before resolving
    pub fn new(context: ResolveContext) -> Self {
        Self {
            context: Arc::new(context),
            base_types: Vec::new(),
            plugin_types: Vec::new(),
            loaded: false,
        }
    }

    /// Registry over an explicit set of types, ready to resolve
    pub fn with_types(
        context: ResolveContext,
        base_types: Vec<ActionTypeDescriptor>,
        plugin_types: Vec<ActionTypeDescriptor>,
    ) -> Self {
        Self {
            context: Arc::new(context),
            base_types,
            plugin_types,
            loaded: true,
        }
    }

    /// Register the built-in base and plugin types
    pub fn load_types(&mut self) {
        self.base_types = types::base_types();
        self.plugin_types = types::plugin_types();
        self.loaded = true;
        tracing::info!(
            base = self.base_types.len(),
            plugins = self.plugin_types.len(),
            "Action types loaded"
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn base_types(&self) -> &[ActionTypeDescriptor] {
        &self.base_types
    }

    pub fn plugin_types(&self) -> &[ActionTypeDescriptor] {
        &self.plugin_types
    }

    pub fn context(&self) -> &ResolveContext {
        &self.context
    }

    /// Swap the settings used for recognition, e.g. after the hub settings change
    pub fn set_context(&mut self, context: ResolveContext) {
        self.context = Arc::new(context);
    }

    fn ensure_loaded(&self) -> RegistryResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(RegistryError::NotLoaded)
        }
    }

    /// Wrap the action in the first base type that recognizes it
    pub fn resolve(&self, action: &GenericAction) -> RegistryResult<Option<ActionType>> {
        self.ensure_loaded()?;

        for descriptor in &self.base_types {
            let mut action_type = descriptor.instantiate(action.clone(), self.context.clone());
            if !action_type.can_handle() {
                continue;
            }

            let plugins = self
                .plugin_types
                .iter()
                .filter_map(|plugin| self.try_instantiate(plugin, action))
                .collect::<Vec<_>>();
            if !plugins.is_empty() {
                tracing::debug!(
                    code = action.code,
                    plugins = plugins.len(),
                    "Plugin types attached"
                );
            }
            action_type.set_plugins(plugins);
            return Ok(Some(action_type));
        }

        tracing::debug!(code = action.code, name = %action.name, "No action type recognized action");
        Ok(None)
    }

    /// Wrap the action in a specific plugin type, whether or not it recognizes the action.
    ///
    /// An unknown plugin id is not an error: a warning is logged and `None` returned.
    pub fn resolve_as_plugin(
        &self,
        action: &GenericAction,
        plugin_id: &str,
    ) -> RegistryResult<Option<ActionType>> {
        self.ensure_loaded()?;

        match self.plugin_descriptor(plugin_id) {
            Some(descriptor) => {
                let mut action_type = descriptor.instantiate(action.clone(), self.context.clone());
                if !action_type.can_handle() {
                    tracing::debug!(plugin_id, code = action.code, "Plugin forced onto unrecognized action");
                }
                Ok(Some(action_type))
            }
            None => {
                tracing::warn!(plugin_id, "Unknown plugin action type");
                Ok(None)
            }
        }
    }

    /// Resolve every action, dropping the ones no type recognizes
    pub fn resolve_all(&self, actions: &[GenericAction]) -> RegistryResult<Vec<ActionType>> {
        let mut resolved = Vec::with_capacity(actions.len());
        for action in actions {
            if let Some(action_type) = self.resolve(action)? {
                resolved.push(action_type);
            }
        }
        Ok(resolved)
    }

    pub fn plugin_descriptor(&self, plugin_id: &str) -> Option<&ActionTypeDescriptor> {
        self.plugin_types.iter().find(|d| d.id == plugin_id)
    }

    /// Fresh typed action for a server action code.
    ///
    /// The catalog supplies the slots; the default type additionally fills
    /// every declared argument with its zero value.
    pub fn new_action(&self, catalog: &Catalog, code: i64) -> RegistryResult<ActionType> {
        let action = catalog.create_action(code)?;
        let mut action_type = self
            .resolve(&action)?
            .ok_or_else(|| RegistryError::UnknownType(format!("code {}", code)))?;

        if let (ActionParams::Generic(params), Some(spec)) =
            (action_type.params_mut(), catalog.spec_for(code))
        {
            params.fill_from_spec(spec);
            action_type.encode();
        }
        Ok(action_type)
    }

    /// Fresh action built from a plugin type's template
    pub fn new_plugin_action(&self, plugin_id: &str) -> RegistryResult<ActionType> {
        self.ensure_loaded()?;
        let descriptor = self
            .plugin_descriptor(plugin_id)
            .ok_or_else(|| RegistryError::UnknownPlugin(plugin_id.to_string()))?;
        let action = descriptor
            .template()
            .ok_or_else(|| RegistryError::NoTemplate(plugin_id.to_string()))?;
        self.resolve_as_plugin(&action, plugin_id)?
            .ok_or_else(|| RegistryError::UnknownPlugin(plugin_id.to_string()))
    }

    fn try_instantiate(
        &self,
        descriptor: &ActionTypeDescriptor,
        action: &GenericAction,
    ) -> Option<ActionType> {
        let mut action_type = descriptor.instantiate(action.clone(), self.context.clone());
        action_type.can_handle().then_some(action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_type::SupportKind;
    use crate::mapper::write_slot;
    use crate::types::http_request::new_http_action;
    use crate::types::{HttpRequestParams, PopupParams};
    use companion_config::HomeassistantSettings;
    use companion_core::{ActionArgSpec, ActionSpec, ArgSlot, ArgValue, PrimitiveType};

    fn context() -> ResolveContext {
        ResolveContext::new(HomeassistantSettings {
            active: true,
            url: "http://hass.local:8123".to_string(),
            token: "secret".to_string(),
            ..Default::default()
        })
    }

    fn loaded() -> ActionTypeRegistry {
        let mut registry = ActionTypeRegistry::new(context());
        registry.load_types();
        registry
    }

    fn popup(message: &str) -> GenericAction {
        GenericAction::new(550, "Popup").with_args(vec![ArgSlot::new(1, "Text", message)])
    }

    fn hass_call() -> GenericAction {
        let mut action = new_http_action();
        write_slot(&mut action, 1, 1);
        write_slot(&mut action, 2, "%HASS_server/api/services/light/turn_on");
        write_slot(&mut action, 5, r#"{"entity_id":"light.kitchen"}"#);
        action
    }

    #[test]
    fn test_resolve_before_load_fails() {
        let registry = ActionTypeRegistry::new(context());
        assert!(matches!(registry.resolve(&popup("x")), Err(RegistryError::NotLoaded)));
        assert!(matches!(
            registry.resolve_as_plugin(&popup("x"), "homeassistant"),
            Err(RegistryError::NotLoaded)
        ));
    }

    #[test]
    fn test_popup_resolves_to_popup_type() {
        let resolved = loaded().resolve(&popup("Hello")).unwrap().unwrap();
        assert_eq!(resolved.id(), "popup");
        assert_eq!(resolved.description(), "Message: Hello");
        assert!(resolved.plugins().is_empty());
    }

    #[test]
    fn test_unknown_action_falls_back_to_default() {
        let resolved = loaded()
            .resolve(&GenericAction::new(30, "Wait"))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id(), "default");
        assert_eq!(resolved.support(), SupportKind::Default);
    }

    #[test]
    fn test_hub_call_gets_plugin_attached() {
        let resolved = loaded().resolve(&hass_call()).unwrap().unwrap();
        assert_eq!(resolved.id(), "http_request");
        assert_eq!(resolved.plugins().len(), 1);

        let plugin = resolved.into_plugin("homeassistant").unwrap();
        assert_eq!(plugin.support(), SupportKind::Plugin);
        assert_eq!(plugin.description(), "light.turn_on (light.kitchen)");
    }

    #[test]
    fn test_plain_http_request_has_no_plugins() {
        let resolved = loaded().resolve(&new_http_action()).unwrap().unwrap();
        assert_eq!(resolved.id(), "http_request");
        assert!(resolved.plugins().is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let registry = ActionTypeRegistry::with_types(
            context(),
            vec![
                ActionTypeDescriptor::of::<HttpRequestParams>(),
                ActionTypeDescriptor::of::<PopupParams>(),
            ],
            vec![],
        );
        assert_eq!(registry.resolve(&popup("x")).unwrap().unwrap().id(), "popup");
        assert!(registry.resolve(&GenericAction::new(30, "Wait")).unwrap().is_none());
    }

    #[test]
    fn test_resolve_as_plugin() {
        let registry = loaded();
        let plugin = registry
            .resolve_as_plugin(&hass_call(), "homeassistant")
            .unwrap()
            .unwrap();
        assert_eq!(plugin.id(), "homeassistant");

        assert!(registry.resolve_as_plugin(&hass_call(), "nope").unwrap().is_none());

        // explicit choice skips recognition
        let forced = registry
            .resolve_as_plugin(&popup("x"), "homeassistant")
            .unwrap()
            .unwrap();
        assert_eq!(forced.id(), "homeassistant");
        assert_eq!(forced.action().code, 550);
    }

    #[test]
    fn test_resolve_all_drops_unrecognized() {
        let registry = ActionTypeRegistry::with_types(
            context(),
            vec![ActionTypeDescriptor::of::<PopupParams>()],
            vec![],
        );
        let mut actions = vec![popup("a"), GenericAction::new(30, "Wait"), popup("b")];
        for (i, action) in actions.iter_mut().enumerate() {
            action.index = i;
        }
        let resolved = registry.resolve_all(&actions).unwrap();
        let indexes: Vec<_> = resolved.iter().map(ActionType::index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    #[test]
    fn test_new_action_fills_declared_args() {
        let spec = ActionSpec {
            category_code: 30,
            code: 30,
            name: "Wait".to_string(),
            can_fail: false,
            args: vec![ActionArgSpec {
                id: 0,
                name: "MS".to_string(),
                primitive_type: PrimitiveType::Int,
                mandatory: true,
            }],
        };
        let catalog = Catalog::new(vec![spec], vec![]);
        let action_type = loaded().new_action(&catalog, 30).unwrap();

        match action_type.params() {
            ActionParams::Generic(params) => assert_eq!(params.get(0), Some(&ArgValue::Int(0))),
            other => panic!("expected generic params, got {:?}", other),
        }
        assert!(matches!(
            loaded().new_action(&catalog, 99),
            Err(RegistryError::Catalog(_))
        ));
    }

    #[test]
    fn test_new_plugin_action() {
        let registry = loaded();
        let mut action_type = registry.new_plugin_action("homeassistant").unwrap();
        if let ActionParams::HomeAssistant(params) = action_type.params_mut() {
            params.service.domain = Some("switch".to_string());
            params.service.service = Some("toggle".to_string());
        }
        action_type.encode();

        let resolved = registry.resolve(action_type.action()).unwrap().unwrap();
        assert_eq!(resolved.plugins().len(), 1);
        assert!(matches!(
            registry.new_plugin_action("nope"),
            Err(RegistryError::UnknownPlugin(_))
        ));
    }
}
