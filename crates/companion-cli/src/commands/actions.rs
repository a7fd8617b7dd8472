//! Listing and editing the actions of the task open in Tasker

use super::connect_tasker;
use crate::{
    cli::{ActionsCommand, OutputFormat},
    error::{CliError, CliResult},
    utils::{truncate_text, ColoredOutput},
};
use companion_connectors::CompanionSession;
use companion_registry::{ActionType, SupportKind};
use serde_json::{json, Value as JsonValue};
use tracing::info;

pub struct ActionsCommandHandler;

impl ActionsCommandHandler {
    pub async fn run(
        session: &mut CompanionSession,
        command: &ActionsCommand,
        format: OutputFormat,
    ) -> CliResult<()> {
        connect_tasker(session).await?;

        match command {
            ActionsCommand::List => Self::list(session, format).await,
            ActionsCommand::Add { code, label } => {
                let mut action = session.new_action(*code)?;
                if let Some(label) = label {
                    action.set_label(label.as_str());
                }
                Self::check(session.add_action(&mut action).await, "Adding action")?;
                info!(code, "Action added");
                println!(
                    "{} {}",
                    ColoredOutput::success("Added"),
                    describe(&action)
                );
                Ok(())
            }
            ActionsCommand::Move { from, to } => {
                Self::check(session.tasker().move_action(*from, *to).await, "Moving action")?;
                println!("{} {} -> {}", ColoredOutput::success("Moved"), from, to);
                Ok(())
            }
            ActionsCommand::Label { index, value } => {
                if value.is_empty() {
                    return Err(CliError::InvalidArgument("Label cannot be empty".to_string()));
                }
                Self::check(session.tasker().save_label(*index, value).await, "Saving label")?;
                println!("{} #{} \"{}\"", ColoredOutput::success("Labelled"), index, value);
                Ok(())
            }
            ActionsCommand::Delete { index } => {
                Self::check(session.tasker().delete_action(*index).await, "Deleting action")?;
                println!("{} #{}", ColoredOutput::success("Deleted"), index);
                Ok(())
            }
        }
    }

    async fn list(session: &CompanionSession, format: OutputFormat) -> CliResult<()> {
        let actions = session.typed_actions(true).await?;

        if !format.is_table() {
            let value: Vec<JsonValue> = actions.iter().map(action_to_json).collect();
            println!("{}", format.format_json(&JsonValue::Array(value))?);
            return Ok(());
        }

        if actions.is_empty() {
            println!("{}", ColoredOutput::info("No actions found"));
            return Ok(());
        }
        println!("{:<5} {:<16} {:<24} {}", "#", "TYPE", "LABEL", "DESCRIPTION");
        for action in &actions {
            let kind = match action.support() {
                SupportKind::Default => ColoredOutput::dim(action.action().name.as_str()),
                SupportKind::Custom => ColoredOutput::highlight(action.name()),
                SupportKind::Plugin => ColoredOutput::success(action.name()),
            };
            println!(
                "{:<5} {:<16} {:<24} {}",
                action.index(),
                kind,
                truncate_text(action.label(), 24),
                truncate_text(action.description(), 60)
            );
            for plugin in action.plugins() {
                println!(
                    "{:<5} {} {}",
                    "",
                    ColoredOutput::dim("as"),
                    ColoredOutput::success(&format!("{}: {}", plugin.name(), plugin.description()))
                );
            }
        }
        Ok(())
    }

    fn check(succeeded: bool, what: &str) -> CliResult<()> {
        if succeeded {
            Ok(())
        } else {
            Err(CliError::OperationFailed(what.to_string()))
        }
    }
}

fn describe(action: &ActionType) -> String {
    if action.description().is_empty() {
        action.action().name.clone()
    } else {
        format!("{} ({})", action.action().name, action.description())
    }
}

fn action_to_json(action: &ActionType) -> JsonValue {
    json!({
        "index": action.index(),
        "type": action.id(),
        "code": action.action().code,
        "name": action.action().name,
        "label": action.label(),
        "description": action.description(),
        "plugins": action.plugins().iter().map(ActionType::id).collect::<Vec<_>>(),
    })
}
