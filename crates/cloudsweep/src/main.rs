mod commands;
mod families;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cloudsweep")]
#[command(about = "Deletes what a cluster left behind, and keeps checking until it's gone", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the cluster's DNS records and permitted networks
    Destroy {
        #[command(flatten)]
        target: Target,
        /// Give up after this many seconds
        #[arg(long, default_value = "900", value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,
        /// Seconds between polls
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: u64,
        /// Print the teardown report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what destroy would delete, without deleting anything
    List {
        #[command(flatten)]
        target: Target,
    },
    /// Show version information
    Version,
}

/// Which cluster, and how to reach its cloud accounts
#[derive(Args)]
pub struct Target {
    /// Path to the installer's metadata.json
    #[arg(short, long, env = "CLOUDSWEEP_METADATA_PATH")]
    metadata: Option<PathBuf>,
    /// IBM Cloud IAM access token
    #[arg(long, env = "IBMCLOUD_IAM_TOKEN", hide_env_values = true)]
    iam_token: Option<String>,
    /// Cloudflare API token; public records are then removed from Cloudflare instead of CIS
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    cloudflare_token: Option<String>,
}

impl Target {
    fn credentials(&self) -> families::Credentials {
        families::Credentials {
            iam_token: self.iam_token.clone(),
            cloudflare_token: self.cloudflare_token.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.command {
        Commands::Destroy {
            target,
            timeout,
            poll_interval,
            json,
        } => {
            commands::destroy::handle(&target, timeout, poll_interval, json).await?;
        }
        Commands::List { target } => {
            commands::list::handle(&target).await?;
        }
        Commands::Version => {
            println!("cloudsweep {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
