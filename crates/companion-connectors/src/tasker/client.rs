//! Client for the Tasker HTTP server running on the phone

use crate::coordinator::RequestCoordinator;
use crate::error::{ConnectorError, ConnectorResult};
use crate::response::{check_status, parse_list};
use crate::status::{ActivityStatus, ConnectionStatus, StatusHandle};
use crate::url_builder::UrlBuilder;
use companion_config::GeneralSettings;
use companion_core::{ActionSpec, CategorySpec, GenericAction, Variable};
use companion_registry::ActionType;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tokio::sync::RwLock;

#[derive(Debug, Serialize)]
struct ActionPayload<'a> {
    action: &'a GenericAction,
    index: usize,
}

/// Owns the connection state and in-memory caches for one Tasker server.
///
/// Failures are absorbed into [`status`](Self::status): listing calls return an
/// empty list and mutations return `false`.
#[derive(Debug)]
pub struct TaskerClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
    coordinator: RequestCoordinator,
    status: StatusHandle,
    action_specs: RwLock<Option<Vec<ActionSpec>>>,
    category_specs: RwLock<Option<Vec<CategorySpec>>>,
    actions: RwLock<Option<Vec<GenericAction>>>,
}

impl TaskerClient {
    /// The token is optional; only the URL is needed to connect
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into();
        let token = token.filter(|t| !t.is_empty());
        let status = ConnectionStatus::initial(&base_url, token.as_deref().unwrap_or(""), false);
        Self {
            base_url,
            token,
            http: reqwest::Client::new(),
            coordinator: RequestCoordinator::default(),
            status: StatusHandle::new(status),
            action_specs: RwLock::new(None),
            category_specs: RwLock::new(None),
            actions: RwLock::new(None),
        }
    }

    pub fn from_settings(settings: &GeneralSettings) -> Self {
        Self::new(settings.tasker_url.clone(), settings.tasker_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    /// Health check; the server answers a healthy ping with exactly `{}`
    pub async fn ping(&self) -> bool {
        if !self.status.status().is_configured() {
            tracing::debug!(status = %self.status.status(), "Tasker not configured, skipping ping");
            return false;
        }

        self.status.set(ConnectionStatus::Connecting, "");
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        let result = self
            .coordinator
            .run("ping", move || self.get_text("/ping", &[]))
            .await;

        match result {
            Ok(body) if body.trim() == "{}" => {
                tracing::info!(url = %self.base_url, "Tasker connected");
                self.status.set(ConnectionStatus::Connected, "");
                true
            }
            Ok(body) => {
                tracing::warn!(body = %body, "Unexpected ping response");
                self.status.set(
                    ConnectionStatus::NoConnection,
                    format!("Unexpected ping response: {}", body.trim()),
                );
                false
            }
            Err(error) => {
                self.record_failure("ping", &error);
                false
            }
        }
    }

    pub async fn action_specs(&self, force: bool) -> Vec<ActionSpec> {
        self.cached_list("action_specs", "/action_specs", &self.action_specs, force)
            .await
    }

    pub async fn category_specs(&self, force: bool) -> Vec<CategorySpec> {
        self.cached_list("category_specs", "/category_specs", &self.category_specs, force)
            .await
    }

    /// Variables change constantly on the phone, so they are never cached
    pub async fn variables(&self) -> Vec<Variable> {
        if !self.require_connected("variables") {
            return Vec::new();
        }
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        match self
            .coordinator
            .run("variables", move || self.get_list::<Variable>("/variables"))
            .await
        {
            Ok(variables) => variables,
            Err(error) => {
                self.record_failure("variables", &error);
                Vec::new()
            }
        }
    }

    /// Actions of the task being edited, each tagged with its list position
    pub async fn list_actions(&self, force: bool) -> Vec<GenericAction> {
        if !self.require_connected("actions") {
            return Vec::new();
        }
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        match self
            .coordinator
            .run("actions", move || self.load_actions(force))
            .await
        {
            Ok(actions) => actions,
            Err(error) => {
                self.record_failure("actions", &error);
                Vec::new()
            }
        }
    }

    async fn load_actions(&self, force: bool) -> ConnectorResult<Vec<GenericAction>> {
        if !force {
            if let Some(actions) = self.actions.read().await.as_ref() {
                tracing::debug!(count = actions.len(), "Actions served from cache");
                return Ok(actions.clone());
            }
        }
        let mut actions: Vec<GenericAction> = self.get_list("/actions").await?;
        for (index, action) in actions.iter_mut().enumerate() {
            action.index = index;
        }
        *self.actions.write().await = Some(actions.clone());
        Ok(actions)
    }

    pub async fn invalidate_actions(&self) {
        *self.actions.write().await = None;
    }

    pub async fn move_action(&self, from: usize, to: usize) -> bool {
        let query = [("from", from.to_string()), ("to", to.to_string())];
        let query = &query;
        self.upload("move", move || self.get_text("/move", query))
            .await
    }

    pub async fn save_label(&self, index: usize, label: &str) -> bool {
        let query = [("index", index.to_string()), ("value", label.to_string())];
        let query = &query;
        self.upload("label", move || self.get_text("/label", query))
            .await
    }

    pub async fn delete_action(&self, index: usize) -> bool {
        let query = [("index", index.to_string())];
        let query = &query;
        self.upload("delete", move || self.get_text("/delete", query))
            .await
    }

    /// Overwrite the action at `index`
    pub async fn replace_action(&self, index: usize, action: &GenericAction) -> bool {
        let payload = ActionPayload { action, index };
        let payload = &payload;
        self.upload("replace", move || {
            self.send_json(Method::PUT, "/actions", payload)
        })
        .await
    }

    /// Encode the typed action and append it to the end of the task
    pub async fn insert_action_last(&self, action_type: &mut ActionType) -> bool {
        action_type.encode();
        let payload = ActionPayload {
            action: action_type.action(),
            index: action_type.index(),
        };
        let payload = &payload;
        self.upload("insert", move || {
            self.send_json(Method::PATCH, "/actions", payload)
        })
        .await
    }

    /// Encode and write back every action in order, stopping at the first failure
    pub async fn replace_all_actions(&self, action_types: &mut [ActionType]) -> bool {
        for action_type in action_types.iter_mut() {
            action_type.encode();
            if !self
                .replace_action(action_type.index(), action_type.action())
                .await
            {
                tracing::warn!(index = action_type.index(), "Replacing actions stopped early");
                return false;
            }
        }
        true
    }

    async fn cached_list<T>(
        &self,
        key: &'static str,
        path: &'static str,
        cache: &RwLock<Option<Vec<T>>>,
        force: bool,
    ) -> Vec<T>
    where
        T: DeserializeOwned + Clone,
    {
        if !self.require_connected(key) {
            return Vec::new();
        }
        let _activity = self.status.activity(ActivityStatus::Retrieving);
        match self
            .coordinator
            .run(key, move || self.load_cached(path, cache, force))
            .await
        {
            Ok(items) => items,
            Err(error) => {
                self.record_failure(key, &error);
                Vec::new()
            }
        }
    }

    // Runs under the coordinator key, so the cache is never filled twice at once
    async fn load_cached<T>(
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
                tracing::debug!(path, count = items.len(), "Served from cache");
                return Ok(items.clone());
            }
        }
        let items: Vec<T> = self.get_list(path).await?;
        *cache.write().await = Some(items.clone());
        Ok(items)
    }

    async fn upload<T, F, Fut>(&self, key: &str, operation: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        if !self.require_connected(key) {
            return false;
        }
        let _activity = self.status.activity(ActivityStatus::Uploading);
        match self.coordinator.run(key, operation).await {
            Ok(_) => {
                self.invalidate_actions().await;
                true
            }
            Err(error) => {
                self.record_failure(key, &error);
                false
            }
        }
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, String)]) -> ConnectorResult<reqwest::RequestBuilder> {
        let url = UrlBuilder::join_with_query(&self.base_url, path, query)?;
        let request = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> ConnectorResult<String> {
        let response = self.request(Method::GET, path, query)?.send().await?;
        Ok(check_status(response).await?.text().await?)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ConnectorResult<Vec<T>> {
        let body = self.get_text(path, &[]).await?;
        Ok(parse_list(path, &body))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ConnectorResult<()> {
        let response = self.request(method, path, &[])?.json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    fn require_connected(&self, operation: &str) -> bool {
        if self.status.is_connected() {
            return true;
        }
        tracing::warn!(operation, status = %self.status.status(), "Tasker not connected, skipping");
        false
    }

    fn record_failure(&self, operation: &str, error: &ConnectorError) {
        tracing::error!(operation, error = %error, "Tasker request failed");
        match error {
            ConnectorError::Authentication(message) => {
                self.status.set(ConnectionStatus::Unauthorized, message.clone())
            }
            other => self.status.set(ConnectionStatus::NoConnection, other.to_string()),
        }
    }
}
