//! Marshal CLI application
//!
//! Runs bulk workflows against a simulated platform loaded from a JSON
//! snapshot, so a workflow's phases, elevation and failure handling can be
//! rehearsed before pointing a real platform client at them.
//!
//! ```bash
//! marshal inspect --snapshot demos/snapshot.json --invoker owner
//! marshal run member-removal --snapshot demos/snapshot.json --invoker owner
//! RUST_LOG=marshal_core=debug marshal run announce --message "hi" ...
//! ```

mod args;
mod commands;
mod console;
mod render;

use args::{Cli, Commands, ConfigAction};
use clap::Parser;
use crate::console::CliConsole;
use marshal_core::LoggingConfig;
use marshal_core::config::{default_config_path, load_config};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    // RUST_LOG wins over the configured level; --verbose wins over both
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        CliConsole::new(true).error(&format!("{:#}", error));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(Some(&config_path))?;
    init_logging(&config.logging, cli.verbose);

    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, &config, cli.verbose).await,
        Commands::Inspect(args) => commands::inspect::execute(args, cli.verbose).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config, &config_path),
            ConfigAction::Init { path, force } => commands::config::init(path.as_deref(), *force),
        },
    }
}
