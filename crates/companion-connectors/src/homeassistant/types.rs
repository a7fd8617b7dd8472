//! Payloads returned by the Home Assistant REST API

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One entry of `GET /api/states`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: IndexMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Entity {
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(JsonValue::as_str)
    }
}

/// One entry of `GET /api/services`: a domain and its services keyed by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainServices {
    pub domain: String,
    #[serde(default)]
    pub services: IndexMap<String, HaService>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HaService {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, JsonValue>,
    #[serde(default)]
    pub target: Option<JsonValue>,
}

/// Grouped fields the hub nests under one key; they are not callable directly
const ADVANCED_FIELDS: &str = "advanced_fields";

/// A single callable service with its fields flattened out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActualService {
    pub id: String,
    pub domain: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<ServiceField>,
    /// Whether the service targets entities
    pub target_entity: bool,
}

impl ActualService {
    pub fn from_service(domain: &str, id: &str, service: &HaService) -> Self {
        let target_entity = service
            .target
            .as_ref()
            .and_then(|target| target.get("entity"))
            .is_some();

        let fields = service
            .fields
            .iter()
            .filter(|(field_id, _)| field_id.as_str() != ADVANCED_FIELDS)
            .map(|(field_id, field)| ServiceField::from_json(field_id, field))
            .collect();

        Self {
            id: id.to_string(),
            domain: domain.to_string(),
            name: service.name.clone(),
            description: service.description.clone(),
            fields,
            target_entity,
        }
    }

    /// `domain.service`, the form Home Assistant uses in automations
    pub fn full_id(&self) -> String {
        format!("{}.{}", self.domain, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ServiceField {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub example: Option<String>,
}

impl ServiceField {
    fn from_json(id: &str, field: &JsonValue) -> Self {
        let text = |key: &str| field.get(key).and_then(JsonValue::as_str).map(str::to_string);
        let example = field.get("example").map(|value| match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        });

        Self {
            id: id.to_string(),
            name: text("name"),
            description: text("description"),
            required: field.get("required").and_then(JsonValue::as_bool).unwrap_or(false),
            example,
        }
    }
}
