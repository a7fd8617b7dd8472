//! Home Assistant service call presented on top of an HTTP Request action

use crate::action_type::{ActionKind, SupportKind};
use crate::context::ResolveContext;
use crate::mapper::{coerce_json_value, KeyValue, ParameterMapper};
use crate::types::http_request::{
    new_http_action, HttpMethod, HttpRequestParams, HTTP_REQUEST_CODE, HTTP_REQUEST_NAME,
};
use companion_config::HomeassistantSettings;
use companion_core::GenericAction;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Service call encoded in a hub URL and JSON body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceData {
    pub is_service: bool,
    pub base_url: String,
    pub api_action_url: String,
    pub domain: Option<String>,
    pub service: Option<String>,
    pub entity_id: Option<String>,
    /// Extra body fields as text; non-string JSON values keep their JSON form
    pub data: Option<IndexMap<String, String>>,
}

impl ServiceData {
    /// Parse `<base>/api/services/<domain>/<service>` plus an optional JSON body.
    ///
    /// URLs that do not point at the configured hub yield an empty value.
    pub fn from_url(url: &str, body: Option<&JsonValue>, hub: &HomeassistantSettings) -> Self {
        let mut service_data = ServiceData::default();
        if !hub.matches_url(url) {
            return service_data;
        }

        let stripped = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .unwrap_or(url);
        let parts: Vec<&str> = stripped.split('/').collect();
        service_data.base_url = parts[0].to_string();

        if parts.len() < 3 {
            return service_data;
        }
        service_data.api_action_url = format!("{}/{}", parts[1], parts[2]);

        if parts[2] == "services" && parts.len() >= 5 {
            service_data.is_service = true;
            service_data.domain = Some(parts[3].to_string());
            service_data.service = Some(parts[4].to_string());

            if let Some(JsonValue::Object(fields)) = body {
                let mut data = IndexMap::new();
                for (key, value) in fields {
                    if key == "entity_id" {
                        service_data.entity_id = Some(json_text(value));
                    } else {
                        data.insert(key.clone(), json_text(value));
                    }
                }
                if !data.is_empty() {
                    service_data.data = Some(data);
                }
            }
        }

        service_data
    }

    /// `domain.service`, or empty when either half is missing
    pub fn service_name(&self) -> String {
        match (self.domain.as_deref(), self.service.as_deref()) {
            (Some(domain), Some(service)) if !domain.is_empty() && !service.is_empty() => {
                format!("{}.{}", domain, service)
            }
            _ => String::new(),
        }
    }

    /// JSON body for the service call; array-looking values are sent as arrays
    pub fn request_body(&self) -> IndexMap<String, JsonValue> {
        let mut body = IndexMap::new();
        if let Some(entity_id) = self.entity_id.as_deref().filter(|e| !e.is_empty()) {
            body.insert("entity_id".to_string(), JsonValue::String(entity_id.to_string()));
        }
        for (key, value) in self.data.iter().flatten() {
            body.insert(key.clone(), coerce_json_value(value));
        }
        body
    }
}

fn json_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomeAssistantParams {
    pub http: HttpRequestParams,
    pub service: ServiceData,
}

impl HomeAssistantParams {
    /// Blank action in the HTTP Request shape this plugin layers on
    pub fn new_action() -> GenericAction {
        new_http_action()
    }
}

impl ParameterMapper for HomeAssistantParams {
    fn decode(action: &GenericAction, ctx: &ResolveContext) -> Self {
        let http = HttpRequestParams::decode(action, ctx);
        let body = serde_json::from_str::<JsonValue>(&http.body).ok();
        let service = ServiceData::from_url(&http.url, body.as_ref(), &ctx.homeassistant);
        Self { http, service }
    }

    fn encode(&mut self, action: &mut GenericAction, ctx: &ResolveContext) {
        let hub = &ctx.homeassistant;
        self.http.url = format!(
            "{}/api/services/{}/{}",
            hub.service_base_url(),
            self.service.domain.as_deref().unwrap_or_default(),
            self.service.service.as_deref().unwrap_or_default()
        );
        self.http.method = HttpMethod::Post;
        self.http.headers = vec![KeyValue::new(
            "Authorization",
            format!("Bearer {}", hub.action_token()),
        )];
        let body = self.service.request_body();
        self.http.body = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());
        self.http.encode(action, ctx);

        // Keep the params in the shape a fresh decode of the action would give
        let body = JsonValue::Object(body.into_iter().collect());
        let written = ServiceData::from_url(&self.http.url, Some(&body), hub);
        if written.is_service {
            self.service = written;
        }
    }
}

impl ActionKind for HomeAssistantParams {
    const ID: &'static str = "homeassistant";
    const NAME: &'static str = "Home Assistant";
    const SUPPORT: SupportKind = SupportKind::Plugin;

    fn recognizes(&self, action: &GenericAction, ctx: &ResolveContext) -> bool {
        action.is(HTTP_REQUEST_CODE, HTTP_REQUEST_NAME)
            && self.http.method == HttpMethod::Post
            && ctx.homeassistant.matches_url(&self.http.url)
    }

    fn describe(&self) -> String {
        let name = self.service.service_name();
        match self.service.entity_id.as_deref() {
            Some(entity) if !entity.is_empty() && !name.is_empty() => {
                format!("{} ({})", name, entity)
            }
            _ => name,
        }
    }

    fn template() -> Option<GenericAction> {
        Some(new_http_action())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::write_slot;
    use crate::types::http_request::{BODY_SLOT, METHOD_SLOT, URL_SLOT};
    use serde_json::json;

    fn ctx() -> ResolveContext {
        ResolveContext::new(HomeassistantSettings {
            active: true,
            url: "http://hass.local:8123".to_string(),
            token: "secret".to_string(),
            ..Default::default()
        })
    }

    fn service_action(url: &str, body: &str) -> GenericAction {
        let mut action = new_http_action();
        write_slot(&mut action, METHOD_SLOT, 1);
        write_slot(&mut action, URL_SLOT, url);
        write_slot(&mut action, BODY_SLOT, body);
        action
    }

    #[test]
    fn test_parse_service_url_and_body() {
        let body = json!({"entity_id": "light.kitchen", "brightness": 120, "color_name": "red"});
        let data = ServiceData::from_url(
            "%HASS_server/api/services/light/turn_on",
            Some(&body),
            &ctx().homeassistant,
        );

        assert!(data.is_service);
        assert_eq!(data.base_url, "%HASS_server");
        assert_eq!(data.api_action_url, "api/services");
        assert_eq!(data.domain.as_deref(), Some("light"));
        assert_eq!(data.service.as_deref(), Some("turn_on"));
        assert_eq!(data.entity_id.as_deref(), Some("light.kitchen"));
        let fields = data.data.unwrap();
        assert_eq!(fields["brightness"], "120");
        assert_eq!(fields["color_name"], "red");
    }

    #[test]
    fn test_non_service_url() {
        let data = ServiceData::from_url("http://hass.local:8123/api/states", None, &ctx().homeassistant);
        assert!(!data.is_service);
        assert_eq!(data.base_url, "hass.local:8123");
        assert_eq!(data.api_action_url, "api/states");
        assert_eq!(data.domain, None);

        let foreign = ServiceData::from_url("http://other/api/services/a/b", None, &ctx().homeassistant);
        assert_eq!(foreign, ServiceData::default());
    }

    #[test]
    fn test_recognizes_post_to_hub_only() {
        let ctx = ctx();
        let action = service_action("%HASS_server/api/services/light/turn_on", "{}");
        assert!(HomeAssistantParams::decode(&action, &ctx).recognizes(&action, &ctx));

        let mut get = action.clone();
        write_slot(&mut get, METHOD_SLOT, 0);
        assert!(!HomeAssistantParams::decode(&get, &ctx).recognizes(&get, &ctx));

        let foreign = service_action("http://example.com/api/services/a/b", "{}");
        assert!(!HomeAssistantParams::decode(&foreign, &ctx).recognizes(&foreign, &ctx));
    }

    #[test]
    fn test_bad_body_is_tolerated() {
        let ctx = ctx();
        let action = service_action("%HASS_server/api/services/light/turn_on", "not json");
        let params = HomeAssistantParams::decode(&action, &ctx);
        assert_eq!(params.service.domain.as_deref(), Some("light"));
        assert_eq!(params.service.entity_id, None);
    }

    #[test]
    fn test_encode_builds_service_call() {
        let ctx = ctx();
        let mut action = new_http_action();
        let mut params = HomeAssistantParams::decode(&action, &ctx);
        params.service.domain = Some("light".to_string());
        params.service.service = Some("turn_on".to_string());
        params.service.entity_id = Some("light.kitchen".to_string());
        params.service.data = Some(IndexMap::from([
            ("brightness".to_string(), "120".to_string()),
            ("rgb_color".to_string(), "[255,0,0]".to_string()),
        ]));
        params.encode(&mut action, &ctx);

        assert_eq!(
            action.slot(URL_SLOT).unwrap().value.to_string(),
            "http://hass.local:8123/api/services/light/turn_on"
        );
        assert_eq!(
            action.slot(3).unwrap().value.to_string(),
            "Authorization:Bearer %HASS_access_token\n"
        );
        let body: JsonValue =
            serde_json::from_str(&action.slot(BODY_SLOT).unwrap().value.to_string()).unwrap();
        assert_eq!(
            body,
            json!({"entity_id": "light.kitchen", "brightness": "120", "rgb_color": [255, 0, 0]})
        );

        let decoded = HomeAssistantParams::decode(&action, &ctx);
        assert_eq!(decoded.service, params.service);
        assert!(decoded.recognizes(&action, &ctx));
        assert_eq!(decoded.describe(), "light.turn_on (light.kitchen)");
    }

    #[test]
    fn test_encode_without_hub_url_uses_variable() {
        let ctx = ResolveContext::new(HomeassistantSettings {
            active: true,
            ..Default::default()
        });
        let mut action = new_http_action();
        let mut params = HomeAssistantParams::decode(&action, &ctx);
        params.service.domain = Some("switch".to_string());
        params.service.service = Some("toggle".to_string());
        params.service.entity_id = Some("switch.fan".to_string());
        params.encode(&mut action, &ctx);

        assert_eq!(
            action.slot(URL_SLOT).unwrap().value.to_string(),
            "%HASS_server/api/services/switch/toggle"
        );
        assert!(params.service.is_service);
        let decoded = HomeAssistantParams::decode(&action, &ctx);
        assert_eq!(decoded.service, params.service);
        assert!(decoded.recognizes(&action, &ctx));
    }

    #[test]
    fn test_body_fields_keep_their_order() {
        let ctx = ctx();
        let action = service_action(
            "%HASS_server/api/services/light/turn_on",
            r#"{"transition":"2","entity_id":"light.desk","color_name":"blue","brightness":"80"}"#,
        );
        let mut params = HomeAssistantParams::decode(&action, &ctx);
        let keys: Vec<&str> = params.service.data.iter().flatten().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["transition", "color_name", "brightness"]);

        let mut written = action.clone();
        params.encode(&mut written, &ctx);
        assert_eq!(
            written.slot(BODY_SLOT).unwrap().value.to_string(),
            r#"{"entity_id":"light.desk","transition":"2","color_name":"blue","brightness":"80"}"#
        );
    }
}
