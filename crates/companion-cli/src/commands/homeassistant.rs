//! Home Assistant listings, direct service calls and service-call actions

use super::{connect_homeassistant, connect_tasker};
use crate::{
    cli::{HaCommand, OutputFormat},
    error::{CliError, CliResult},
    utils::{parse_data, parse_service, truncate_text, ColoredOutput},
};
use anyhow::Context;
use companion_connectors::{ActualService, CompanionSession, Entity};
use companion_registry::ActionParams;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

const PLUGIN_ID: &str = "homeassistant";

pub struct HaCommandHandler;

impl HaCommandHandler {
    pub async fn run(
        session: &mut CompanionSession,
        command: &HaCommand,
        format: OutputFormat,
    ) -> CliResult<()> {
        connect_homeassistant(session).await?;

        match command {
            HaCommand::Entities { domain } => {
                let entities: Vec<Entity> = session
                    .homeassistant()
                    .entities(false)
                    .await
                    .into_iter()
                    .filter(|e| domain.as_deref().map_or(true, |d| e.domain() == d))
                    .collect();
                if format.is_table() {
                    display_entities(&entities);
                } else {
                    println!("{}", format.format_json(&serde_json::to_value(&entities)?)?);
                }
                Ok(())
            }
            HaCommand::Services { domain } => {
                let services: Vec<ActualService> = session
                    .homeassistant()
                    .services_flat(false)
                    .await
                    .into_iter()
                    .filter(|s| domain.as_deref().map_or(true, |d| s.domain == d))
                    .collect();
                if format.is_table() {
                    display_services(&services);
                } else {
                    println!("{}", format.format_json(&serde_json::to_value(&services)?)?);
                }
                Ok(())
            }
            HaCommand::Call {
                service,
                entity_id,
                data,
            } => {
                let (domain, name) = parse_service(service)?;
                let data = parse_data(data.as_deref())?;
                let called = session
                    .homeassistant()
                    .call_service(&domain, &name, entity_id, data.as_ref())
                    .await?;
                if !called {
                    return Err(CliError::OperationFailed(format!(
                        "Calling {} ({})",
                        service,
                        session.homeassistant().status().message()
                    )));
                }
                println!("{} {} on {}", ColoredOutput::success("Called"), service, entity_id);
                Ok(())
            }
            HaCommand::Add {
                service,
                entity_id,
                data,
                label,
            } => {
                Self::add(session, service, entity_id, data.as_deref(), label.as_deref()).await
            }
        }
    }

    /// Build a plugin action for the service call and append it to the task
    async fn add(
        session: &mut CompanionSession,
        service: &str,
        entity_id: &str,
        data: Option<&str>,
        label: Option<&str>,
    ) -> CliResult<()> {
        connect_tasker(session).await?;
        let (domain, name) = parse_service(service)?;
        let data = parse_data(data)?;

        let mut action = session
            .new_plugin_action(PLUGIN_ID)
            .context("Creating Home Assistant action")?;
        let ActionParams::HomeAssistant(params) = action.params_mut() else {
            return Err(CliError::General(format!(
                "Plugin '{}' did not produce a Home Assistant action",
                PLUGIN_ID
            )));
        };
        params.service.domain = Some(domain);
        params.service.service = Some(name);
        params.service.entity_id = Some(entity_id.to_string());
        params.service.data = data.as_ref().and_then(data_fields);
        debug!(service, entity_id, "Encoding service call action");

        if let Some(label) = label {
            action.set_label(label);
        }
        if !session.add_action(&mut action).await {
            return Err(CliError::OperationFailed("Adding service call action".to_string()));
        }
        info!(service, entity_id, "Service call action added");
        println!(
            "{} {}",
            ColoredOutput::success("Added"),
            action.description()
        );
        Ok(())
    }
}

/// Service data as the text fields stored in the action body
fn data_fields(data: &JsonValue) -> Option<IndexMap<String, String>> {
    let fields: IndexMap<String, String> = data
        .as_object()?
        .iter()
        .map(|(key, value)| {
            let text = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect();
    (!fields.is_empty()).then_some(fields)
}

fn display_entities(entities: &[Entity]) {
    if entities.is_empty() {
        println!("{}", ColoredOutput::info("No entities found"));
        return;
    }
    println!("{:<40} {:<20} {}", "ENTITY", "STATE", "NAME");
    for entity in entities {
        println!(
            "{:<40} {:<20} {}",
            ColoredOutput::highlight(&entity.entity_id),
            truncate_text(&entity.state, 20),
            ColoredOutput::dim(entity.friendly_name().unwrap_or(""))
        );
    }
}

fn display_services(services: &[ActualService]) {
    if services.is_empty() {
        println!("{}", ColoredOutput::info("No services found"));
        return;
    }
    for service in services {
        let target = if service.target_entity { " [entity]" } else { "" };
        println!(
            "{}{} {}",
            ColoredOutput::highlight(&service.full_id()),
            ColoredOutput::dim(target),
            truncate_text(service.description.as_deref().unwrap_or(""), 60)
        );
        for field in &service.fields {
            let required = if field.required { "*" } else { "" };
            let example = field
                .example
                .as_deref()
                .map(|e| format!(" (e.g. {})", e))
                .unwrap_or_default();
            println!(
                "    {}{}{}",
                field.id,
                ColoredOutput::warning(required),
                ColoredOutput::dim(&example)
            );
        }
    }
}
