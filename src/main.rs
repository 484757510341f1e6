use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use feedsync::config::expand_env;
use feedsync::{Command, Config, HttpFeedSource, NotionStore, SyncRunner};

/// Exit status when interrupted (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

/// Mirror RSS/Atom feeds into a Notion database
#[derive(Parser, Debug)]
#[command(name = "feedsync", version, about)]
struct Cli {
    /// Path to the YAML (or .toml) configuration file; $VAR references are expanded
    #[arg(short, long, default_value = "./config.yml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CliCommand {
    /// Create or update records for fresh feed items
    Pull,
    /// Archive stale records whose status is in clean.status
    Clean,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Pull => Command::Pull,
            CliCommand::Clean => Command::Clean,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = Command::from(cli.command);

    let config_path = expand_env(&cli.config);
    let mut config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Err(e) = feedsync::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        feedsync::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config
        .validate()
        .and_then(|_| config.validate_for_store(command == Command::Pull))
    {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let source = match HttpFeedSource::new(&config.fetch) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = match NotionStore::new(&config.notion) {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("feedsync {} ({})", env!("CARGO_PKG_VERSION"), config_path);

    let runner = SyncRunner::new(&source, &store, &config);
    let summary = tokio::select! {
        summary = runner.run(command, Utc::now()) => summary,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; outstanding requests abandoned");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    if summary.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
