//! URL joining for remote endpoints

use crate::error::{ConnectorError, ConnectorResult};
use url::Url;

pub struct UrlBuilder;

impl UrlBuilder {
    /// Append an endpoint path to a base URL, keeping any path the base already has.
    ///
    /// - `join("http://phone:1821", "/ping")` -> `http://phone:1821/ping`
    /// - `join("http://hass.local/ha/", "/api/states")` -> `http://hass.local/ha/api/states`
    pub fn join(base_url: &str, path: &str) -> ConnectorResult<Url> {
        let mut base = Url::parse(base_url).map_err(|e| {
            ConnectorError::InvalidConfig(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if path.is_empty() {
            return Ok(base);
        }

        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/')).map_err(|e| {
            ConnectorError::InvalidConfig(format!(
                "Failed to join URL '{}' with path '{}': {}",
                base_url, path, e
            ))
        })
    }

    /// Join and append query parameters in the given order
    pub fn join_with_query(
        base_url: &str,
        path: &str,
        query_params: &[(&str, String)],
    ) -> ConnectorResult<Url> {
        let mut url = Self::join(base_url, path)?;
        if !query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_keeps_base_path() {
        assert_eq!(
            UrlBuilder::join("http://phone:1821", "/ping").unwrap().as_str(),
            "http://phone:1821/ping"
        );
        assert_eq!(
            UrlBuilder::join("http://hass.local/ha", "/api/services/light/turn_on")
                .unwrap()
                .as_str(),
            "http://hass.local/ha/api/services/light/turn_on"
        );
        assert_eq!(
            UrlBuilder::join("http://hass.local:8123/", "api/").unwrap().as_str(),
            "http://hass.local:8123/api/"
        );
    }

    #[test]
    fn test_query_is_encoded() {
        let url = UrlBuilder::join_with_query(
            "http://phone:1821",
            "/label",
            &[("index", "2".to_string()), ("value", "Turn on & off".to_string())],
        )
        .unwrap();
        assert_eq!(url.as_str(), "http://phone:1821/label?index=2&value=Turn+on+%26+off");
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            UrlBuilder::join("not a url", "/ping"),
            Err(ConnectorError::InvalidConfig(_))
        ));
    }
}
