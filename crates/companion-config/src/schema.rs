//! Settings schema shared by the clients and the action-type registry

use serde::{Deserialize, Serialize};

pub const DEFAULT_REPLACE_URL_VAR: &str = "%HASS_server";
pub const DEFAULT_REPLACE_TOKEN_VAR: &str = "%HASS_access_token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompanionSettings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub homeassistant: HomeassistantSettings,
}

/// Tasker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GeneralSettings {
    #[serde(default)]
    pub tasker_url: String,
    /// Optional bearer token for the Tasker HTTP server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasker_token: Option<String>,
}

/// Home Assistant hub settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeassistantSettings {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    /// Tasker variable that stands for the hub URL inside stored actions
    #[serde(default = "default_replace_url_var")]
    pub replace_url_var: String,
    /// Tasker variable that stands for the access token inside stored actions
    #[serde(default = "default_replace_token_var")]
    pub replace_token_var: String,
    #[serde(default)]
    pub fetch_phone_ip: bool,
    #[serde(default)]
    pub phone_ip_entity_id: String,
}

fn default_replace_url_var() -> String {
    DEFAULT_REPLACE_URL_VAR.to_string()
}

fn default_replace_token_var() -> String {
    DEFAULT_REPLACE_TOKEN_VAR.to_string()
}

impl Default for HomeassistantSettings {
    fn default() -> Self {
        Self {
            active: false,
            url: String::new(),
            token: String::new(),
            replace_url_var: default_replace_url_var(),
            replace_token_var: default_replace_token_var(),
            fetch_phone_ip: false,
            phone_ip_entity_id: String::new(),
        }
    }
}

impl HomeassistantSettings {
    /// Token as it should be written into a stored Tasker action
    pub fn action_token(&self) -> &str {
        if self.replace_token_var.is_empty() {
            &self.token
        } else {
            &self.replace_token_var
        }
    }

    /// Base written into stored service-call URLs; the URL variable stands in
    /// when no literal hub URL is configured
    pub fn service_base_url(&self) -> &str {
        if self.url.is_empty() {
            &self.replace_url_var
        } else {
            &self.url
        }
    }

    /// Whether a stored URL points at the hub, either literally or through the URL variable
    pub fn matches_url(&self, url: &str) -> bool {
        (!self.replace_url_var.is_empty() && url.starts_with(&self.replace_url_var))
            || (!self.url.is_empty() && url.starts_with(&self.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: CompanionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.homeassistant.replace_url_var, "%HASS_server");
        assert_eq!(settings.homeassistant.replace_token_var, "%HASS_access_token");
        assert!(!settings.homeassistant.active);
        assert!(settings.general.tasker_url.is_empty());
    }

    #[test]
    fn test_matches_url() {
        let mut hass = HomeassistantSettings {
            url: "http://hass.local:8123".to_string(),
            ..Default::default()
        };
        assert!(hass.matches_url("%HASS_server/api/services/light/turn_on"));
        assert!(hass.matches_url("http://hass.local:8123/api/services/light/turn_on"));
        assert!(!hass.matches_url("http://other/api"));

        hass.url.clear();
        hass.replace_url_var.clear();
        assert!(!hass.matches_url("http://other/api"));
    }

    #[test]
    fn test_action_token_prefers_variable() {
        let mut hass = HomeassistantSettings {
            token: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(hass.action_token(), "%HASS_access_token");
        hass.replace_token_var.clear();
        assert_eq!(hass.action_token(), "abc");
    }

    #[test]
    fn test_service_base_url_falls_back_to_variable() {
        let mut hass = HomeassistantSettings::default();
        assert_eq!(hass.service_base_url(), "%HASS_server");
        hass.url = "http://hass.local:8123".to_string();
        assert_eq!(hass.service_base_url(), "http://hass.local:8123");
    }
}
