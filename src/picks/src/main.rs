//! keiba-picks CLI

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keiba_picks::cli::{self, Cli, Commands};
use keiba_picks::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keiba_picks=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load_from(cli.config.as_deref())?;
    tracing::debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Commands::Expand {
            ticket_type,
            notation,
            format,
        } => cli::run_expand(&config, ticket_type, notation, format),
        Commands::Infer {
            races,
            payouts,
            tickets,
            format,
            threshold,
        } => cli::run_infer(config, races, payouts, tickets, format, threshold),
    }
}
