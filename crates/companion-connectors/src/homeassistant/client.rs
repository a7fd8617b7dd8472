use super::types::{ActualService, DomainServices, Entity};
use crate::coordinator::RequestCoordinator;
use crate::error::{ConnectorError, ConnectorResult};
use crate::response::{check_status, parse_list};
use crate::status::{ActivityStatus, ConnectionStatus, StatusHandle};
use crate::url_builder::UrlBuilder;
use companion_config::HomeassistantSettings;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

const NO_SERVICES_MESSAGE: &str = "No services found in Home Assistant";

/// Client for the Home Assistant REST API.
///
/// Both a URL and a long-lived access token are needed before any request is made.
#[derive(Debug)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    coordinator: RequestCoordinator,
    status: StatusHandle,
    entities: RwLock<Option<Vec<Entity>>>,
    services: RwLock<Option<Vec<DomainServices>>>,
}

impl HomeAssistantClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let token = token.into();
        let status = ConnectionStatus::initial(&base_url, &token, true);
        Self::with_status(base_url, token, status)
    }

    /// A disabled integration gets a client that never touches the network
    pub fn from_settings(settings: &HomeassistantSettings) -> Self {
        if !settings.active {
            return Self::with_status(String::new(), String::new(), ConnectionStatus::Disabled);
        }
        Self::new(settings.url.clone(), settings.token.clone())
    }

    fn with_status(base_url: String, token: String, status: ConnectionStatus) -> Self {
        Self {
            base_url,
            token,
            http: reqwest::Client::new(),
            coordinator: RequestCoordinator::default(),
            status: StatusHandle::new(status),
            entities: RwLock::new(None),
            services: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    pub async fn ping(&self) -> bool {
        if !self.status.status().is_configured() {
            tracing::debug!(status = %self.status.status(), "Home Assistant not configured, skipping ping");
            return false;
        }

        self.status.set(ConnectionStatus::Connecting, "");
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        match self
            .coordinator
            .run("ping", move || self.get_json::<JsonValue>("/api/"))
            .await
        {
            Ok(_) => {
                tracing::info!(url = %self.base_url, "Home Assistant connected");
                self.status.set(ConnectionStatus::Connected, "");
                true
            }
            Err(error) => {
                self.record_failure("ping", &error, "Can't connect to Home Assistant");
                false
            }
        }
    }

    pub async fn entities(&self, force: bool) -> Vec<Entity> {
        if !self.require_connected("entities") {
            return Vec::new();
        }
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        match self
            .coordinator
            .run("entities", move || self.load_list("/api/states", &self.entities, force))
            .await
        {
            Ok(entities) => entities,
            Err(error) => {
                self.record_failure("entities", &error, "Can't retrieve entities from Home Assistant");
                Vec::new()
            }
        }
    }

    /// Current state of one entity, from the cached entity list
    pub async fn entity_state(&self, entity_id: &str) -> Option<String> {
        self.entities(false)
            .await
            .into_iter()
            .find(|entity| entity.entity_id == entity_id)
            .map(|entity| entity.state)
    }

    /// Services grouped by domain, as the hub reports them
    pub async fn services(&self, force: bool) -> Vec<DomainServices> {
        if !self.require_connected("services") {
            return Vec::new();
        }
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        match self
            .coordinator
            .run("services", move || self.load_list("/api/services", &self.services, force))
            .await
        {
            Ok(services) => {
                tracing::debug!(domains = services.len(), "Retrieved services from Home Assistant");
                services
            }
            Err(error) => {
                self.record_failure("services", &error, "Can't retrieve services from Home Assistant");
                Vec::new()
            }
        }
    }

    /// Every callable service across all domains.
    ///
    /// A connected hub that reports no services at all is treated as unreachable.
    pub async fn services_flat(&self, force: bool) -> Vec<ActualService> {
        if !self.status.is_connected() {
            return Vec::new();
        }

        let flat: Vec<ActualService> = self
            .services(force)
            .await
            .iter()
            .flat_map(|domain| {
                domain
                    .services
                    .iter()
                    .map(move |(id, service)| ActualService::from_service(&domain.domain, id, service))
            })
            .collect();

        if flat.is_empty() {
            tracing::warn!("{}", NO_SERVICES_MESSAGE);
            self.status.set(ConnectionStatus::NoConnection, NO_SERVICES_MESSAGE);
        }
        flat
    }

    /// Call `domain.service` on `entity_id`, merging `data` fields into the body.
    ///
    /// Fails with [`ConnectorError::NotConnected`] carrying the last status message
    /// when the hub is not connected; otherwise reports success as a bool.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
        data: Option<&JsonValue>,
    ) -> ConnectorResult<bool> {
        if !self.status.is_connected() {
            return Err(ConnectorError::NotConnected(self.status.message()));
        }

        let mut body: IndexMap<String, JsonValue> = IndexMap::new();
        body.insert("entity_id".to_string(), JsonValue::String(entity_id.to_string()));
        if let Some(JsonValue::Object(fields)) = data {
            for (key, value) in fields {
                body.insert(key.clone(), value.clone());
            }
        }

        let path = format!("/api/services/{}/{}", domain, service);
        let path = path.as_str();
        let body = &body;
        let key = format!("call:{}.{}", domain, service);

        let _activity = self.status.activity(ActivityStatus::Uploading);
        match self.coordinator.run(&key, move || self.post_json(path, body)).await {
            Ok(()) => {
                tracing::info!(domain, service, entity_id, "Service called");
                self.status.set(ConnectionStatus::Connected, "");
                Ok(true)
            }
            Err(error) => {
                self.record_failure("call_service", &error, "Service call failed");
                Ok(false)
            }
        }
    }

    async fn load_list<T>(
        &self,
        path: &str,
        cache: &RwLock<Option<Vec<T>>>,
        force: bool,
    ) -> ConnectorResult<Vec<T>>
    where
        T: DeserializeOwned + Clone,
    {
        if !force {
            if let Some(items) = cache.read().await.as_ref() {
                return Ok(items.clone());
            }
        }
        let response = self.send(reqwest::Method::GET, path)?.send().await?;
        let body = check_status(response).await?.text().await?;
        let items: Vec<T> = parse_list(path, &body);
        *cache.write().await = Some(items.clone());
        Ok(items)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConnectorResult<T> {
        let response = self.send(reqwest::Method::GET, path)?.send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn post_json(&self, path: &str, body: &IndexMap<String, JsonValue>) -> ConnectorResult<()> {
        let response = self.send(reqwest::Method::POST, path)?.json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    fn send(&self, method: reqwest::Method, path: &str) -> ConnectorResult<reqwest::RequestBuilder> {
        let url = UrlBuilder::join(&self.base_url, path)?;
        Ok(self.http.request(method, url).bearer_auth(&self.token))
    }

    fn require_connected(&self, operation: &str) -> bool {
        if self.status.is_connected() {
            return true;
        }
        tracing::warn!(operation, status = %self.status.status(), "Home Assistant not connected, skipping");
        false
    }

    fn record_failure(&self, operation: &str, error: &ConnectorError, context: &str) {
        tracing::error!(operation, error = %error, "Home Assistant request failed");
        match error {
            ConnectorError::Authentication(message) => {
                self.status.set(ConnectionStatus::Unauthorized, message.clone())
            }
            other => self
                .status
                .set(ConnectionStatus::NoConnection, format!("{}, error: {}", context, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    async fn connected(server: &MockServer) -> HomeAssistantClient {
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/")
                    .header("Authorization", "Bearer secret");
                then.status(200).json_body(json!({"message": "API running."}));
            })
            .await;
        let client = HomeAssistantClient::new(server.base_url(), "secret");
        assert!(client.ping().await);
        client
    }

    #[test]
    fn test_token_is_required() {
        let client = HomeAssistantClient::new("http://hass.local:8123", "");
        assert_eq!(client.status().status(), ConnectionStatus::NoCredential);

        let disabled = HomeAssistantClient::from_settings(&HomeassistantSettings {
            active: false,
            ..Default::default()
        });
        assert_eq!(disabled.status().status(), ConnectionStatus::Disabled);
    }

    #[tokio::test]
    async fn test_unauthorized_ping() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/");
                then.status(401).body("401: Unauthorized");
            })
            .await;

        let client = HomeAssistantClient::new(server.base_url(), "expired");
        assert!(!client.ping().await);
        let snapshot = client.status().snapshot();
        assert_eq!(snapshot.status, ConnectionStatus::Unauthorized);
        assert_eq!(snapshot.message, "Unauthorized, check your access token");
    }

    #[tokio::test]
    async fn test_entities_cached() {
        let server = MockServer::start_async().await;
        let client = connected(&server).await;
        let states = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/states");
                then.status(200).json_body(json!([
                    {"entity_id": "light.kitchen", "state": "on", "attributes": {}},
                    {"entity_id": "sensor.phone_ip", "state": "192.168.1.20", "attributes": {}}
                ]));
            })
            .await;

        assert_eq!(client.entities(false).await.len(), 2);
        assert_eq!(
            client.entity_state("sensor.phone_ip").await.as_deref(),
            Some("192.168.1.20")
        );
        assert_eq!(states.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_services_flat() {
        let server = MockServer::start_async().await;
        let client = connected(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/services");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"[
                            {"domain": "light", "services": {
                                "turn_on": {"name": "Turn on", "fields": {}, "target": {"entity": {}}},
                                "turn_off": {"name": "Turn off", "fields": {}}
                            }},
                            {"domain": "notify", "services": {
                                "mobile_app": {"fields": {"title": {}, "message": {"required": true}}}
                            }}
                        ]"#,
                    );
            })
            .await;

        let services = client.services_flat(false).await;
        let ids: Vec<_> = services.iter().map(ActualService::full_id).collect();
        assert_eq!(ids, vec!["light.turn_on", "light.turn_off", "notify.mobile_app"]);
        assert!(services[0].target_entity);
        assert!(!services[1].target_entity);
        assert_eq!(services[2].fields[0].id, "title");
        assert!(services[2].fields[1].required);
    }

    #[tokio::test]
    async fn test_no_services_marks_no_connection() {
        let server = MockServer::start_async().await;
        let client = connected(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/services");
                then.status(200).json_body(json!([]));
            })
            .await;

        assert!(client.services_flat(false).await.is_empty());
        let snapshot = client.status().snapshot();
        assert_eq!(snapshot.status, ConnectionStatus::NoConnection);
        assert_eq!(snapshot.message, "No services found in Home Assistant");
    }

    #[tokio::test]
    async fn test_call_service_merges_data() {
        let server = MockServer::start_async().await;
        let client = connected(&server).await;
        let call = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/services/light/turn_on")
                    .header("Authorization", "Bearer secret")
                    .json_body(json!({"entity_id": "light.kitchen", "brightness_pct": 40}));
                then.status(200).json_body(json!([]));
            })
            .await;

        let data = json!({"brightness_pct": 40});
        let called = client
            .call_service("light", "turn_on", "light.kitchen", Some(&data))
            .await
            .unwrap();
        assert!(called);
        call.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_service_failure_updates_status() {
        let server = MockServer::start_async().await;
        let client = connected(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/services/light/toggle");
                then.status(400).body("Invalid entity");
            })
            .await;

        let called = client
            .call_service("light", "toggle", "light.nope", None)
            .await
            .unwrap();
        assert!(!called);
        assert_eq!(client.status().status(), ConnectionStatus::NoConnection);
    }

    #[tokio::test]
    async fn test_call_service_requires_connection() {
        let client = HomeAssistantClient::new("", "");
        let result = client.call_service("light", "turn_on", "light.kitchen", None).await;
        assert!(matches!(result, Err(ConnectorError::NotConnected(_))));
    }
}
