//! Read-only listings served by Tasker: action specs, categories and variables

use super::connect_tasker;
use crate::{
    cli::OutputFormat,
    error::CliResult,
    utils::{truncate_text, ColoredOutput},
};
use companion_connectors::CompanionSession;
use companion_core::{ActionSpec, Catalog, Variable};
use serde_json::Value as JsonValue;
use tracing::debug;

pub struct CatalogCommand;

impl CatalogCommand {
    pub async fn specs(
        session: &mut CompanionSession,
        category: Option<i64>,
        format: OutputFormat,
    ) -> CliResult<()> {
        connect_tasker(session).await?;
        debug!(?category, "Listing action specs");

        let catalog = session.catalog();
        let specs: Vec<&ActionSpec> = match category {
            Some(code) => catalog.specs_in_category(code).collect(),
            None => catalog.action_specs().iter().collect(),
        };

        if format.is_table() {
            Self::display_specs_table(catalog, &specs);
        } else {
            println!("{}", format.format_json(&serde_json::to_value(&specs)?)?);
        }
        Ok(())
    }

    pub async fn categories(session: &mut CompanionSession, format: OutputFormat) -> CliResult<()> {
        connect_tasker(session).await?;
        let categories = session.catalog().category_specs();

        if !format.is_table() {
            println!("{}", format.format_json(&serde_json::to_value(categories)?)?);
            return Ok(());
        }
        if categories.is_empty() {
            println!("{}", ColoredOutput::info("No categories found"));
            return Ok(());
        }
        println!("{:<8} {}", "CODE", "NAME");
        for category in categories {
            let count = session.catalog().specs_in_category(category.code).count();
            println!(
                "{:<8} {} {}",
                category.code,
                category.name,
                ColoredOutput::dim(&format!("({} actions)", count))
            );
        }
        Ok(())
    }

    pub async fn variables(session: &mut CompanionSession, format: OutputFormat) -> CliResult<()> {
        connect_tasker(session).await?;
        let variables = session.tasker().variables().await;

        if format.is_table() {
            Self::display_variables_table(&variables);
        } else {
            println!("{}", format.format_json(&serde_json::to_value(&variables)?)?);
        }
        Ok(())
    }

    fn display_specs_table(catalog: &Catalog, specs: &[&ActionSpec]) {
        if specs.is_empty() {
            println!("{}", ColoredOutput::info("No action specs found"));
            return;
        }

        println!(
            "{}",
            ColoredOutput::success(&format!("Found {} action spec(s):", specs.len()))
        );
        println!();
        println!("{:<8} {:<32} {:<20} {}", "CODE", "NAME", "CATEGORY", "ARGS");
        for spec in specs {
            let category = catalog
                .category(spec.category_code)
                .map(|c| c.name.as_str())
                .unwrap_or("-");
            let args: Vec<String> = spec
                .args
                .iter()
                .map(|arg| {
                    let marker = if arg.mandatory { "*" } else { "" };
                    format!("{}{}:{}", arg.name, marker, arg.primitive_type.as_str())
                })
                .collect();
            println!(
                "{:<8} {:<32} {:<20} {}",
                spec.code,
                truncate_text(&spec.name, 32),
                truncate_text(category, 20),
                ColoredOutput::dim(&args.join(", "))
            );
        }
    }

    fn display_variables_table(variables: &[Variable]) {
        if variables.is_empty() {
            println!("{}", ColoredOutput::info("No variables found"));
            return;
        }
        for variable in variables {
            let value = match &variable.value {
                Some(JsonValue::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            println!("{:<32} {}", ColoredOutput::highlight(&variable.name), truncate_text(&value, 80));
        }
    }
}

