use crate::env_resolver::EnvResolver;
use crate::error::{ConfigError, ConfigResult};
use crate::schema::CompanionSettings;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// Supported file formats for settings
#[derive(Debug, Clone, PartialEq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// Detect file format from extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }
}

/// Loads companion settings from YAML/JSON with `${VAR:default}` expansion
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    resolver: EnvResolver,
}

impl SettingsLoader {
    pub fn new(resolver: EnvResolver) -> Self {
        Self { resolver }
    }

    /// Load settings from a file
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<CompanionSettings> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        self.parse_content(&content, format)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(&self, path: P) -> ConfigResult<CompanionSettings> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(CompanionSettings::default());
        }
        self.load_from_file(path)
    }

    /// Parse settings content directly
    pub fn parse_content(&self, content: &str, format: FileFormat) -> ConfigResult<CompanionSettings> {
        if content.trim().is_empty() {
            return Ok(CompanionSettings::default());
        }
        let root_json: JsonValue = match format {
            FileFormat::Yaml => serde_yaml::from_str(content)?,
            FileFormat::Json => serde_json::from_str(content)?,
        };
        // A comment-only YAML document parses as null
        let root_json = if root_json.is_null() {
            JsonValue::Object(Default::default())
        } else {
            root_json
        };

        let resolved = self.resolver.resolve(&root_json)?;
        let mut settings: CompanionSettings = serde_json::from_value(resolved)?;
        normalize(&mut settings);
        validate(&settings)?;
        Ok(settings)
    }

    /// Write settings back to disk in the format implied by the extension
    pub fn save_to_file<P: AsRef<Path>>(
        &self,
        settings: &CompanionSettings,
        path: P,
    ) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = match FileFormat::from_path(path)? {
            FileFormat::Yaml => serde_yaml::to_string(settings)?,
            FileFormat::Json => serde_json::to_string_pretty(settings)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

fn normalize(settings: &mut CompanionSettings) {
    settings.general.tasker_url = trim_url(&settings.general.tasker_url);
    settings.homeassistant.url = trim_url(&settings.homeassistant.url);
    if matches!(settings.general.tasker_token.as_deref(), Some("")) {
        settings.general.tasker_token = None;
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn validate(settings: &CompanionSettings) -> ConfigResult<()> {
    for (field, url) in [
        ("general.tasker_url", &settings.general.tasker_url),
        ("homeassistant.url", &settings.homeassistant.url),
    ] {
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{} must start with http:// or https:// (got '{}')",
                field, url
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_format_detection() {
        assert_eq!(FileFormat::from_path("a.yaml").unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path("a.yml").unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path("a.json").unwrap(), FileFormat::Json);
        assert!(matches!(
            FileFormat::from_path("a.toml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_yaml_with_env_default() {
        let yaml = r#"
general:
  tasker_url: "${COMPANION_LOADER_TEST_URL:http://192.168.1.20:1821/}"
homeassistant:
  active: true
  url: http://hass.local:8123
  token: secret
"#;
        let settings = SettingsLoader::default()
            .parse_content(yaml, FileFormat::Yaml)
            .unwrap();

        assert_eq!(settings.general.tasker_url, "http://192.168.1.20:1821");
        assert!(settings.homeassistant.active);
        assert_eq!(settings.homeassistant.token, "secret");
        assert_eq!(settings.homeassistant.replace_url_var, "%HASS_server");
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let settings = SettingsLoader::default()
            .parse_content("", FileFormat::Yaml)
            .unwrap();
        assert_eq!(settings, CompanionSettings::default());
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = SettingsLoader::default()
            .parse_content(r#"{"general": {"tasker_url": "192.168.1.20"}}"#, FileFormat::Json)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_and_save_roundtrip() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"general": {{"tasker_url": "http://phone:1821", "tasker_token": ""}}}}"#
        )
        .unwrap();

        let loader = SettingsLoader::default();
        let mut settings = loader.load_from_file(file.path()).unwrap();
        assert_eq!(settings.general.tasker_token, None);

        settings.homeassistant.active = true;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("settings.yaml");
        loader.save_to_file(&settings, &out).unwrap();

        let reloaded = loader.load_from_file(&out).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::default()
            .load_or_default(dir.path().join("absent.json"))
            .unwrap();
        assert_eq!(settings, CompanionSettings::default());
    }
}
