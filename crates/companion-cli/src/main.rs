//! Companion CLI main entry point

use clap::Parser;
use companion_cli::{
    cli::{Cli, Commands},
    commands::{
        open_session, ActionsCommandHandler, CatalogCommand, HaCommandHandler, StatusCommand,
    },
    error::CliResult,
    utils::{init_tracing, ColoredOutput},
};
use tracing::debug;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", ColoredOutput::error("Error:"), e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    debug!("Companion CLI v{}", env!("CARGO_PKG_VERSION"));

    let mut session = open_session(&cli.config, cli.tasker_url.as_deref())?;
    let format = cli.format;

    match &cli.command {
        Commands::Status => StatusCommand::run(&mut session, format).await,
        Commands::Specs { category } => CatalogCommand::specs(&mut session, *category, format).await,
        Commands::Categories => CatalogCommand::categories(&mut session, format).await,
        Commands::Variables => CatalogCommand::variables(&mut session, format).await,
        Commands::Actions { command } => {
            ActionsCommandHandler::run(&mut session, command, format).await
        }
        Commands::Ha { command } => HaCommandHandler::run(&mut session, command, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_cli::cli::{ActionsCommand, HaCommand, OutputFormat};

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["companion", "--config", "/tmp/companion.json", "status"])
            .unwrap();

        assert_eq!(cli.config, "/tmp/companion.json");
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "companion",
            "specs",
            "--category",
            "10",
            "--format",
            "json",
            "--tasker-url",
            "http://192.168.1.20:1821",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.tasker_url.as_deref(), Some("http://192.168.1.20:1821"));
        assert!(matches!(cli.command, Commands::Specs { category: Some(10) }));
    }

    #[test]
    fn test_actions_subcommands() {
        let cli = Cli::try_parse_from(["companion", "actions", "move", "0", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Actions {
                command: ActionsCommand::Move { from: 0, to: 3 }
            }
        ));

        let cli = Cli::try_parse_from(["companion", "actions", "add", "548", "--label", "Flash it"])
            .unwrap();
        if let Commands::Actions {
            command: ActionsCommand::Add { code, label },
        } = cli.command
        {
            assert_eq!(code, 548);
            assert_eq!(label.as_deref(), Some("Flash it"));
        } else {
            panic!("Expected actions add");
        }

        assert!(Cli::try_parse_from(["companion", "actions", "delete"]).is_err());
    }

    #[test]
    fn test_ha_call_parsing() {
        let cli = Cli::try_parse_from([
            "companion",
            "ha",
            "call",
            "light.turn_on",
            "light.kitchen",
            "--data",
            r#"{"brightness_pct": 40}"#,
        ])
        .unwrap();

        if let Commands::Ha {
            command:
                HaCommand::Call {
                    service,
                    entity_id,
                    data,
                },
        } = cli.command
        {
            assert_eq!(service, "light.turn_on");
            assert_eq!(entity_id, "light.kitchen");
            assert!(data.is_some());
        } else {
            panic!("Expected ha call");
        }
    }
}
