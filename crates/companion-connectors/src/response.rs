//! Response checks shared by both remote clients

use crate::error::{ConnectorError, ConnectorResult};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub(crate) const UNAUTHORIZED_MESSAGE: &str = "Unauthorized, check your access token";

/// Map 401 and other non-success statuses to errors
pub(crate) async fn check_status(response: Response) -> ConnectorResult<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ConnectorError::Authentication(UNAUTHORIZED_MESSAGE.to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ConnectorError::Status {
            code: status.as_u16(),
            message: message.chars().take(200).collect(),
        });
    }
    Ok(response)
}

/// Parse a JSON array leniently: malformed payloads and entries become "no data"
pub(crate) fn parse_list<T: DeserializeOwned>(what: &str, body: &str) -> Vec<T> {
    let items = match serde_json::from_str::<JsonValue>(body) {
        Ok(JsonValue::Array(items)) => items,
        Ok(_) => {
            tracing::warn!(what, "Expected a JSON array, treating as empty");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(what, error = %e, "Malformed JSON, treating as empty");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(what, error = %e, "Skipping malformed entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homeassistant::DomainServices;
    use companion_core::CategorySpec;

    #[test]
    fn test_parse_list_is_lenient() {
        let parsed: Vec<CategorySpec> =
            parse_list("categories", r#"[{"code": 10, "name": "Alert"}, {"name": 3}]"#);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Alert");

        assert!(parse_list::<CategorySpec>("categories", r#"{"code": 1}"#).is_empty());
        assert!(parse_list::<CategorySpec>("categories", "<html>").is_empty());
    }

    #[test]
    fn test_parse_list_keeps_object_key_order() {
        let parsed: Vec<DomainServices> = parse_list(
            "services",
            r#"[{"domain": "switch", "services": {"turn_on": {}, "toggle": {}, "turn_off": {}}}]"#,
        );
        let ids: Vec<&str> = parsed[0].services.keys().map(String::as_str).collect();
        assert_eq!(ids, ["turn_on", "toggle", "turn_off"]);
    }
}
