pub mod actions;
pub mod catalog;
pub mod homeassistant;
pub mod status;

// Re-export command handlers
pub use actions::ActionsCommandHandler;
pub use catalog::CatalogCommand;
pub use homeassistant::HaCommandHandler;
pub use status::StatusCommand;

use crate::error::CliResult;
use crate::utils::require_connected;
use companion_config::SettingsLoader;
use companion_connectors::CompanionSession;
use tracing::debug;

/// Load settings and build a session; `tasker_url` overrides the file value
pub fn open_session(config: &str, tasker_url: Option<&str>) -> CliResult<CompanionSession> {
    let mut settings = SettingsLoader::default().load_or_default(config)?;
    if let Some(url) = tasker_url {
        debug!(url, "Tasker URL overridden from the command line");
        settings.general.tasker_url = url.to_string();
    }
    Ok(CompanionSession::new(settings))
}

/// Connect to Tasker or fail with its status
pub(crate) async fn connect_tasker(session: &mut CompanionSession) -> CliResult<()> {
    let connected = session.reload_tasker().await;
    require_connected("Tasker", connected, session.tasker().status().snapshot())
}

/// Connect to Home Assistant or fail with its status
pub(crate) async fn connect_homeassistant(session: &mut CompanionSession) -> CliResult<()> {
    let connected = session.reload_homeassistant().await;
    require_connected(
        "Home Assistant",
        connected,
        session.homeassistant().status().snapshot(),
    )
}
