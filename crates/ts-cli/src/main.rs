use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use ts_cli::commands::util::{AppStore, build_categorizer, open_store};
use ts_cli::commands::{categories, log, suggest, summary, track};
use ts_cli::{Cli, Commands, Config};
use ts_core::Session;

/// Load config and open the store.
fn open(config_path: Option<&Path>) -> Result<(AppStore, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let store = open_store(&config)?;
    Ok((store, config))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Track) => {
            let (mut store, config) = open(cli.config.as_deref())?;
            let categorizer = match build_categorizer(&config, &store) {
                Ok(categorizer) => Some(categorizer),
                Err(err) => {
                    tracing::debug!(error = %err, "suggestions unavailable");
                    None
                }
            };
            let mut session = Session::default();
            runtime()?.block_on(track::run_session(
                BufReader::new(tokio::io::stdin()),
                &mut stdout,
                &mut session,
                &mut store,
                categorizer.as_ref(),
            ))?;
        }
        Some(Commands::Categories(action)) => {
            let (mut store, _config) = open(cli.config.as_deref())?;
            categories::run(&mut stdout, &mut store, action)?;
        }
        Some(Commands::Log(args)) => {
            let (mut store, _config) = open(cli.config.as_deref())?;
            log::run(&mut stdout, &mut store, args)?;
        }
        Some(Commands::Summary { json }) => {
            let (store, _config) = open(cli.config.as_deref())?;
            summary::run(&mut stdout, &store, *json)?;
        }
        Some(Commands::Suggest(args)) => {
            let (store, config) = open(cli.config.as_deref())?;
            let categorizer = build_categorizer(&config, &store)?;
            runtime()?.block_on(suggest::run(
                &mut stdout,
                &categorizer,
                store.categories(),
                args,
            ))?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
