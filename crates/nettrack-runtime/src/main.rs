//! nettrack: logs when a device joins or leaves the local network.
//! Probes with nmap, debounces flicker, appends transitions to a CSV file and
//! pushes that file to a git remote.

use clap::Parser;

mod cli;
mod config;
mod publish_worker;
mod run;
mod sleeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("NETTRACK_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let settings = config::Settings::from_cli(&args)?;
    tracing::debug!(?settings, "settings resolved");

    run::run(settings).await
}
