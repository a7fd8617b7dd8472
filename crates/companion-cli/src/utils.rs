//! Utility functions for the CLI

use crate::error::{CliError, CliResult};
use colored::{ColoredString, Colorize};
use companion_connectors::{ConnectionStatus, StatusSnapshot};
use serde_json::Value as JsonValue;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize tracing; `RUST_LOG` wins over the verbose flag
pub fn init_tracing(verbose: bool) -> CliResult<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::General(format!("Failed to set tracing subscriber: {}", e)))?;

    Ok(())
}

/// Utility for colored console output
pub struct ColoredOutput;

impl ColoredOutput {
    pub fn success(msg: &str) -> ColoredString {
        msg.green().bold()
    }

    pub fn error(msg: &str) -> ColoredString {
        msg.red().bold()
    }

    pub fn warning(msg: &str) -> ColoredString {
        msg.yellow().bold()
    }

    pub fn info(msg: &str) -> ColoredString {
        msg.blue()
    }

    pub fn dim(msg: &str) -> ColoredString {
        msg.dimmed()
    }

    pub fn highlight(msg: &str) -> ColoredString {
        msg.cyan().bold()
    }

    /// Connection status colored by health
    pub fn status(status: ConnectionStatus) -> ColoredString {
        match status {
            ConnectionStatus::Connected => Self::success(status.as_str()),
            ConnectionStatus::Connecting => Self::info(status.as_str()),
            ConnectionStatus::Disabled => Self::dim(status.as_str()),
            ConnectionStatus::Unauthorized | ConnectionStatus::NoConnection => {
                Self::error(status.as_str())
            }
            _ => Self::warning(status.as_str()),
        }
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Split `domain.service` into its halves
pub fn parse_service(service: &str) -> CliResult<(String, String)> {
    match service.split_once('.') {
        Some((domain, name)) if !domain.is_empty() && !name.is_empty() => {
            Ok((domain.to_string(), name.to_string()))
        }
        _ => Err(CliError::InvalidArgument(format!(
            "Invalid service '{}', expected <domain>.<service>",
            service
        ))),
    }
}

/// Parse optional `--data` JSON; it must be an object when given
pub fn parse_data(data: Option<&str>) -> CliResult<Option<JsonValue>> {
    let Some(raw) = data else {
        return Ok(None);
    };
    let value: JsonValue = serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidArgument(format!("Invalid JSON data: {}", e)))?;
    if !value.is_object() {
        return Err(CliError::InvalidArgument(
            "Service data must be a JSON object".to_string(),
        ));
    }
    Ok(Some(value))
}

/// Fail with the client's last status when it did not connect
pub fn require_connected(
    service: &'static str,
    connected: bool,
    snapshot: StatusSnapshot,
) -> CliResult<()> {
    if connected {
        return Ok(());
    }
    let message = if snapshot.message.is_empty() {
        String::new()
    } else {
        format!(": {}", snapshot.message)
    };
    Err(CliError::NotConnected {
        service,
        status: snapshot.status.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_connectors::ActivityStatus;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("Turn on the kitchen light", 12), "Turn on t...");
    }

    #[test]
    fn test_parse_service() {
        assert_eq!(
            parse_service("light.turn_on").unwrap(),
            ("light".to_string(), "turn_on".to_string())
        );
        assert!(parse_service("light").is_err());
        assert!(parse_service(".turn_on").is_err());
    }

    #[test]
    fn test_parse_data_requires_object() {
        assert!(parse_data(None).unwrap().is_none());
        assert!(parse_data(Some(r#"{"brightness_pct": 40}"#)).unwrap().is_some());
        assert!(matches!(parse_data(Some("[1]")), Err(CliError::InvalidArgument(_))));
        assert!(matches!(parse_data(Some("{")), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_require_connected_reports_status() {
        let snapshot = StatusSnapshot {
            status: ConnectionStatus::Unauthorized,
            message: "Unauthorized, check your access token".to_string(),
            activity: ActivityStatus::Idle,
        };
        let error = require_connected("Tasker", false, snapshot).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Tasker is not connected (unauthorized): Unauthorized, check your access token"
        );
    }
}
