mod replay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grabfood-cli")]
#[command(about = "GrabFood restaurant listing capture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the capture pipeline against a recorded browser session
    Replay {
        /// Session recording (page heights and intercepted exchanges) as JSON
        #[arg(long)]
        session: PathBuf,
        /// CSV output path (overrides GRABFOOD_OUTPUT_CSV)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Gzip JSON output path (overrides GRABFOOD_OUTPUT_JSON_GZ)
        #[arg(long)]
        json_gz: Option<PathBuf>,
        /// Delivery location typed into the search box (overrides GRABFOOD_LOCATION)
        #[arg(long)]
        location: Option<String>,
        /// Search endpoint URL to capture (overrides GRABFOOD_SEARCH_URL)
        #[arg(long)]
        search_url: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = grabfood_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            session,
            csv,
            json_gz,
            location,
            search_url,
        } => {
            if let Some(csv) = csv {
                config.output_csv = csv;
            }
            if let Some(json_gz) = json_gz {
                config.output_json_gz = json_gz;
            }
            if let Some(location) = location {
                config.location = Some(location);
            }
            if let Some(search_url) = search_url {
                config.search_url = search_url;
            }
            replay::run_replay(&config, &session).await?;
        }
        Commands::Config => println!("{config:#?}"),
    }

    Ok(())
}
