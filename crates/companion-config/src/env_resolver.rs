//! Environment variable resolution with whitelist and default value support

use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const PLACEHOLDER_PATTERN: &str = r"\$\{([^}:]+)(?::([^}]*))?\}";

/// Errors that can occur during environment variable resolution
#[derive(Debug, Error)]
pub enum EnvResolverError {
    #[error("Environment variable '{0}' not found and no default provided")]
    VarNotFound(String),
    #[error("Environment variable '{0}' is not in whitelist. Allowed prefixes: {1:?}")]
    VarNotWhitelisted(String, Vec<String>),
    #[error("Invalid variable syntax: '{0}'. Expected ${{VAR}} or ${{VAR:default}}")]
    InvalidSyntax(String),
    #[error("Recursive variable reference detected in '{0}'")]
    RecursiveReference(String),
}

fn placeholder_regex() -> Result<&'static Regex, EnvResolverError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = RE.get() {
        return Ok(re);
    }
    let re = Regex::new(PLACEHOLDER_PATTERN)
        .map_err(|e| EnvResolverError::InvalidSyntax(e.to_string()))?;
    Ok(RE.get_or_init(|| re))
}

/// Environment variable resolver with whitelist support
#[derive(Debug, Clone)]
pub struct EnvResolver {
    /// Allowed prefixes for environment variables; empty means no restrictions
    allowed_prefixes: Vec<String>,
    /// Maximum recursion depth to prevent infinite loops
    max_depth: usize,
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec![
                "COMPANION_".to_string(),
                "TASKER_".to_string(),
                "HASS_".to_string(),
            ],
            max_depth: 10,
        }
    }
}

impl EnvResolver {
    /// Create a new resolver with specified allowed prefixes
    pub fn new(allowed_prefixes: Vec<String>) -> Self {
        Self {
            allowed_prefixes,
            max_depth: 10,
        }
    }

    /// Create a resolver with no restrictions (allow all variables)
    pub fn unrestricted() -> Self {
        Self::new(vec![])
    }

    /// Resolve environment variables in a JSON value.
    /// Supports ${VAR} and ${VAR:default} syntax inside strings.
    pub fn resolve(&self, value: &JsonValue) -> Result<JsonValue, EnvResolverError> {
        self.resolve_recursive(value, 0, &mut HashSet::new())
    }

    fn resolve_recursive(
        &self,
        value: &JsonValue,
        depth: usize,
        visited: &mut HashSet<String>,
    ) -> Result<JsonValue, EnvResolverError> {
        if depth > self.max_depth {
            return Err(EnvResolverError::RecursiveReference(
                "Maximum recursion depth exceeded".to_string(),
            ));
        }

        match value {
            JsonValue::String(s) => self.resolve_string(s, visited),
            JsonValue::Object(obj) => {
                let mut resolved_obj = serde_json::Map::new();
                for (key, val) in obj {
                    let resolved_val = self.resolve_recursive(val, depth + 1, visited)?;
                    resolved_obj.insert(key.clone(), resolved_val);
                }
                Ok(JsonValue::Object(resolved_obj))
            }
            JsonValue::Array(arr) => arr
                .iter()
                .map(|item| self.resolve_recursive(item, depth + 1, visited))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(
        &self,
        input: &str,
        visited: &mut HashSet<String>,
    ) -> Result<JsonValue, EnvResolverError> {
        if !input.contains("${") {
            return Ok(JsonValue::String(input.to_string()));
        }

        if visited.contains(input) {
            return Err(EnvResolverError::RecursiveReference(input.to_string()));
        }
        visited.insert(input.to_string());

        let re = placeholder_regex()?;
        let mut result = input.to_string();
        let mut rounds = 0;

        // Resolved values may themselves contain placeholders
        while re.is_match(&result) {
            if rounds > self.max_depth {
                return Err(EnvResolverError::RecursiveReference(input.to_string()));
            }
            rounds += 1;

            let mut next = result.clone();
            for caps in re.captures_iter(&result) {
                let full_match = &caps[0];
                let var_name = &caps[1];
                let default_value = caps.get(2).map(|m| m.as_str());

                self.validate_var_name(var_name)?;

                let env_value = match env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => match default_value {
                        Some(default) => default.to_string(),
                        None => return Err(EnvResolverError::VarNotFound(var_name.to_string())),
                    },
                };
                next = next.replace(full_match, &env_value);
            }
            result = next;
        }

        visited.remove(input);

        // Settings only carry strings and booleans
        match result.as_str() {
            "true" => Ok(JsonValue::Bool(true)),
            "false" => Ok(JsonValue::Bool(false)),
            _ => Ok(JsonValue::String(result)),
        }
    }

    fn validate_var_name(&self, var_name: &str) -> Result<(), EnvResolverError> {
        if self.allowed_prefixes.is_empty()
            || self
                .allowed_prefixes
                .iter()
                .any(|prefix| var_name.starts_with(prefix))
        {
            return Ok(());
        }

        Err(EnvResolverError::VarNotWhitelisted(
            var_name.to_string(),
            self.allowed_prefixes.clone(),
        ))
    }
}
