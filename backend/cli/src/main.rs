mod app;
mod catalog_cmd;
mod run_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use app::RunFlags;
use terminal_output::note_error;

#[derive(Parser)]
#[command(name = "pulsedrive")]
#[command(about = "Pulse Drive: predictive maintenance agent workflow console")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PULSEDRIVE_CONFIG_DIR/config.yaml or ~/.pulsedrive/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow scenario and follow its events
    Run {
        /// Scenario id (see `pulsedrive scenarios`)
        scenario: String,
        /// Use the local simulator even if the backend is configured
        #[arg(long)]
        offline: bool,
        /// Skip simulated pauses
        #[arg(long)]
        instant: bool,
        /// Print the final console view as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Stream events from the backend until interrupted
    Watch,
    /// List the built-in scenarios
    Scenarios,
    /// List the pipeline agents
    Agents,
    /// Show configuration and backend health
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        note_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scenarios => {
            catalog_cmd::scenarios();
            return Ok(());
        }
        Commands::Agents => {
            catalog_cmd::agents();
            return Ok(());
        }
        _ => {}
    }

    let config_path = app::resolve_config_path(cli.config);
    let config = app::bootstrap(&config_path).await?;

    match cli.command {
        Commands::Run {
            scenario,
            offline,
            instant,
            json,
        } => run_cmd::run(&config, &scenario, RunFlags { offline, instant }, json).await,
        Commands::Watch => run_cmd::watch(&config).await,
        Commands::Status => status_cmd::run(&config, &config_path).await,
        Commands::Scenarios | Commands::Agents => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "pulsedrive",
            "run",
            "urgent-failure",
            "--offline",
            "--instant",
            "--config",
            "/tmp/pd.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pd.yaml")));
        match cli.command {
            Commands::Run {
                scenario,
                offline,
                instant,
                json,
            } => {
                assert_eq!(scenario, "urgent-failure");
                assert!(offline && instant && !json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_scenario() {
        assert!(Cli::try_parse_from(["pulsedrive", "run"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
