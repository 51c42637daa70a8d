//! CodeRover command-line interface.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{agent, code, models};
use config::RoverConfig;

/// CodeRover - plan, generate and pick the best code from an LLM
///
/// Rover asks a planning model to structure each request, samples a
/// code-writing model at several temperatures and keeps the best-scoring
/// candidate. It can also run a tool-using agent against a workspace.
#[derive(Parser, Debug)]
#[command(
    name = "rover",
    author,
    version,
    about = "CodeRover - multi-candidate code generation and tool-use agent"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error); defaults to the config value or info
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Configuration file layered over ~/.rover/config.toml and ./.roverrc
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive plan-then-code loop
    ///
    /// Reads one request per line; `quit`, `exit` or `q` stops the loop.
    Code {
        /// Attempts per request while the best candidate looks truncated
        #[arg(long, default_value_t = code::DEFAULT_ATTEMPTS)]
        attempts: usize,
    },

    /// Run the tool-use agent once
    Agent {
        /// What the agent should do
        request: String,

        /// Directory the file and shell tools operate in
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,

        /// Model to drive the agent (defaults to the orchestrator model)
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum generation calls before giving up (0 for no limit)
        #[arg(long, default_value_t = agent::DEFAULT_MAX_TURNS)]
        max_turns: usize,
    },

    /// Show the configured models and their providers
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RoverConfig::load(args.config.as_deref())?;

    let level = parse_level(
        args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("info"),
    );
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Code { attempts } => code::execute(&config, attempts).await?,
        Command::Agent { request, workspace, model, max_turns } => {
            agent::execute(&config, &request, workspace, model, max_turns).await?;
        }
        Command::Models { json } => models::execute(&config, json)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "rover",
            "--log-level",
            "debug",
            "agent",
            "list files",
            "--workspace",
            "/tmp",
            "--max-turns",
            "3",
        ])
        .unwrap();

        assert_eq!(args.log_level.as_deref(), Some("debug"));
        match args.command {
            Some(Command::Agent { request, workspace, model, max_turns }) => {
                assert_eq!(request, "list files");
                assert_eq!(workspace, PathBuf::from("/tmp"));
                assert_eq!(model, None);
                assert_eq!(max_turns, 3);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let args = Args::try_parse_from(["rover", "models", "--config", "rover.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("rover.toml")));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }
}
