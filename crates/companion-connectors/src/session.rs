//! Process-wide state shared by every command: settings, clients, registry and catalog

use crate::error::ConnectorResult;
use crate::homeassistant::HomeAssistantClient;
use crate::tasker::TaskerClient;
use companion_config::CompanionSettings;
use companion_core::Catalog;
use companion_registry::{ActionType, ActionTypeRegistry, ResolveContext};

/// Owns the settings together with everything derived from them.
///
/// Changing settings goes through [`set_settings`](Self::set_settings) followed by
/// the reload methods, so clients and the resolve context never disagree with
/// the settings they were built from.
#[derive(Debug)]
pub struct CompanionSession {
    settings: CompanionSettings,
    tasker: TaskerClient,
    homeassistant: HomeAssistantClient,
    registry: ActionTypeRegistry,
    catalog: Catalog,
}

impl CompanionSession {
    pub fn new(settings: CompanionSettings) -> Self {
        let mut registry = ActionTypeRegistry::new(ResolveContext::from(&settings));
        registry.load_types();
        Self {
            tasker: TaskerClient::from_settings(&settings.general),
            homeassistant: HomeAssistantClient::from_settings(&settings.homeassistant),
            settings,
            registry,
            catalog: Catalog::default(),
        }
    }

    pub fn settings(&self) -> &CompanionSettings {
        &self.settings
    }

    /// Replace the settings; clients pick them up on the next reload
    pub fn set_settings(&mut self, settings: CompanionSettings) {
        self.registry.set_context(ResolveContext::from(&settings));
        self.settings = settings;
    }

    pub fn tasker(&self) -> &TaskerClient {
        &self.tasker
    }

    pub fn homeassistant(&self) -> &HomeAssistantClient {
        &self.homeassistant
    }

    pub fn registry(&self) -> &ActionTypeRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rebuild the Tasker client and, once connected, load the action catalog
    pub async fn reload_tasker(&mut self) -> bool {
        self.tasker = TaskerClient::from_settings(&self.settings.general);
        if self.settings.general.tasker_url.is_empty() {
            tracing::info!("Tasker URL not set, skipping connection");
            return false;
        }
        if !self.tasker.ping().await {
            return false;
        }

        let action_specs = self.tasker.action_specs(true).await;
        let category_specs = self.tasker.category_specs(true).await;
        tracing::info!(
            actions = action_specs.len(),
            categories = category_specs.len(),
            "Loaded Tasker catalog"
        );
        self.catalog = Catalog::new(action_specs, category_specs);
        true
    }

    /// Rebuild the hub client and, once connected, warm the service and entity caches
    pub async fn reload_homeassistant(&mut self) -> bool {
        self.homeassistant = HomeAssistantClient::from_settings(&self.settings.homeassistant);
        self.registry
            .set_context(ResolveContext::from(&self.settings));
        if !self.settings.homeassistant.active {
            tracing::debug!("Home Assistant disabled");
            return false;
        }
        if !self.homeassistant.ping().await {
            return false;
        }

        let services = self.homeassistant.services_flat(true).await;
        let entities = self.homeassistant.entities(true).await;
        tracing::info!(
            services = services.len(),
            entities = entities.len(),
            "Preloaded Home Assistant data"
        );
        self.homeassistant.status().is_connected()
    }

    /// Current actions resolved to their types; actions no type recognizes are left out
    pub async fn typed_actions(&self, force: bool) -> ConnectorResult<Vec<ActionType>> {
        let actions = self.tasker.list_actions(force).await;
        Ok(self.registry.resolve_all(&actions)?)
    }

    pub fn new_action(&self, code: i64) -> ConnectorResult<ActionType> {
        Ok(self.registry.new_action(&self.catalog, code)?)
    }

    pub fn new_plugin_action(&self, plugin_id: &str) -> ConnectorResult<ActionType> {
        Ok(self.registry.new_plugin_action(plugin_id)?)
    }

    /// Encode and overwrite the action at its own index
    pub async fn save_action(&self, action_type: &mut ActionType) -> bool {
        action_type.encode();
        self.tasker
            .replace_action(action_type.index(), action_type.action())
            .await
    }

    /// Encode and append to the end of the task
    pub async fn add_action(&self, action_type: &mut ActionType) -> bool {
        self.tasker.insert_action_last(action_type).await
    }

    /// Phone address as reported by the configured hub entity, when that lookup is enabled
    pub async fn phone_ip(&self) -> Option<String> {
        let hub = &self.settings.homeassistant;
        if !hub.fetch_phone_ip || hub.phone_ip_entity_id.is_empty() {
            return None;
        }
        self.homeassistant
            .entity_state(&hub.phone_ip_entity_id)
            .await
            .filter(|state| !state.is_empty() && state != "unknown" && state != "unavailable")
    }
}
