//! # Affinity Explorer
//!
//! Command line client for the Affinity API: browse the catalog and keep a
//! recently viewed list that follows you once you sign in.

use clap::Parser;

mod app;
mod cli;
mod config;
mod telemetry;

use app::Explorer;
use cli::Cli;
use config::ExplorerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_format == cli::LogFormat::Json);

    let config = ExplorerConfig::from_env();
    tracing::debug!(
        api = %config.client.base_url,
        data_dir = %config.data_dir.display(),
        "Starting Affinity Explorer"
    );

    let explorer = Explorer::open(&config, cli.user).await?;
    explorer.run(cli.command, &mut std::io::stdout().lock()).await?;

    Ok(())
}
