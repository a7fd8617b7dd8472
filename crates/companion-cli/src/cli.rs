//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;

#[derive(Parser)]
#[command(
    name = "companion",
    about = "Companion - mirror and edit a Tasker task, with Home Assistant services",
    version,
    author = "Companion Team"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file path
    #[arg(
        long,
        global = true,
        env = "COMPANION_CONFIG",
        default_value = "./companion.yaml",
        help = "Path to the YAML or JSON settings file"
    )]
    pub config: String,

    /// Override the Tasker URL from the settings file
    #[arg(long, global = true, env = "COMPANION_TASKER_URL")]
    pub tasker_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table", help = "Output format")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the connection state of Tasker and Home Assistant
    Status,

    /// List the action specifications known to Tasker
    Specs {
        /// Only show actions of this category code
        #[arg(long, help = "Filter by category code")]
        category: Option<i64>,
    },

    /// List action categories
    Categories,

    /// List Tasker global variables
    Variables,

    /// Inspect and edit the actions of the current task
    Actions {
        #[command(subcommand)]
        command: ActionsCommand,
    },

    /// Home Assistant entities and services
    Ha {
        #[command(subcommand)]
        command: HaCommand,
    },
}

#[derive(Subcommand)]
pub enum ActionsCommand {
    /// List actions with their resolved types
    List,

    /// Append a new action built from its specification
    Add {
        /// Action code as listed by `companion specs`
        code: i64,

        #[arg(long, help = "Label for the new action")]
        label: Option<String>,
    },

    /// Move an action to another position
    Move { from: usize, to: usize },

    /// Set the label of an action
    Label { index: usize, value: String },

    /// Delete an action
    Delete { index: usize },
}

#[derive(Subcommand)]
pub enum HaCommand {
    /// List entities
    Entities {
        #[arg(long, help = "Filter by domain (e.g. light)")]
        domain: Option<String>,
    },

    /// List callable services
    Services {
        #[arg(long, help = "Filter by domain (e.g. light)")]
        domain: Option<String>,
    },

    /// Call a service right away
    Call {
        /// Service as <domain>.<service>, e.g. light.turn_on
        service: String,

        /// Target entity, e.g. light.kitchen
        entity_id: String,

        #[arg(long, help = "Extra service data as a JSON object")]
        data: Option<String>,
    },

    /// Append a Tasker action that calls a service
    Add {
        /// Service as <domain>.<service>, e.g. light.turn_on
        service: String,

        /// Target entity, e.g. light.kitchen
        entity_id: String,

        #[arg(long, help = "Extra service data as a JSON object")]
        data: Option<String>,

        #[arg(long, help = "Label for the new action")]
        label: Option<String>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// Pretty-printed JSON
    Pretty,
    /// Compact JSON
    Json,
}

impl OutputFormat {
    /// Format a JSON value according to the output format
    pub fn format_json(&self, value: &JsonValue) -> Result<String, serde_json::Error> {
        match self {
            Self::Table | Self::Pretty => serde_json::to_string_pretty(value),
            Self::Json => serde_json::to_string(value),
        }
    }

    pub fn is_table(&self) -> bool {
        *self == Self::Table
    }
}
