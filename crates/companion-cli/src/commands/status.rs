//! Connection overview for both remote systems

use crate::{
    cli::OutputFormat,
    error::CliResult,
    utils::ColoredOutput,
};
use companion_connectors::{CompanionSession, StatusSnapshot};
use serde_json::json;

pub struct StatusCommand;

impl StatusCommand {
    pub async fn run(session: &mut CompanionSession, format: OutputFormat) -> CliResult<()> {
        session.reload_tasker().await;
        session.reload_homeassistant().await;

        let tasker = session.tasker().status().snapshot();
        let homeassistant = session.homeassistant().status().snapshot();
        let phone_ip = session.phone_ip().await;

        if !format.is_table() {
            let value = json!({
                "tasker": {
                    "url": session.tasker().base_url(),
                    "status": tasker,
                    "actions": session.catalog().action_specs().len(),
                    "categories": session.catalog().category_specs().len(),
                },
                "homeassistant": {
                    "url": session.homeassistant().base_url(),
                    "status": homeassistant,
                },
                "phone_ip": phone_ip,
            });
            println!("{}", format.format_json(&value)?);
            return Ok(());
        }

        Self::print_line("Tasker", session.tasker().base_url(), &tasker);
        if !session.catalog().is_empty() {
            println!(
                "  {}",
                ColoredOutput::dim(&format!(
                    "{} action specs in {} categories",
                    session.catalog().action_specs().len(),
                    session.catalog().category_specs().len()
                ))
            );
        }
        Self::print_line("Home Assistant", session.homeassistant().base_url(), &homeassistant);
        if let Some(ip) = phone_ip {
            println!("  {} {}", ColoredOutput::dim("Phone IP:"), ip);
        }
        Ok(())
    }

    fn print_line(name: &str, url: &str, snapshot: &StatusSnapshot) {
        let url = if url.is_empty() { "-" } else { url };
        println!(
            "{:<16} {:<16} {}",
            ColoredOutput::highlight(name),
            ColoredOutput::status(snapshot.status),
            url
        );
        if !snapshot.message.is_empty() {
            println!("  {}", ColoredOutput::warning(&snapshot.message));
        }
    }
}
