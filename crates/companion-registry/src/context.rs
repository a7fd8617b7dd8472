use companion_config::{CompanionSettings, HomeassistantSettings};

/// Settings an action type may consult while recognizing or encoding an action
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub homeassistant: HomeassistantSettings,
}

impl ResolveContext {
    pub fn new(homeassistant: HomeassistantSettings) -> Self {
        Self { homeassistant }
    }
}

impl From<&CompanionSettings> for ResolveContext {
    fn from(settings: &CompanionSettings) -> Self {
        Self::new(settings.homeassistant.clone())
    }
}
