//! platform-bootstrap - installs Cluster API and FluxCD on a management cluster
//!
//! Cluster API is installed through clusterctl with kubeadm and AWS
//! providers. Flux is installed from manifests pinned in the platform
//! repository and pointed at it over SSH.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cli::{ClusterArgs, FluxArgs};

#[derive(Parser, Debug)]
#[command(name = "platform-bootstrap")]
#[command(about = "Install Cluster API and FluxCD on a management cluster", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Settings file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install Cluster API with kubeadm and AWS providers
    Capi(ClusterArgs),
    /// Install FluxCD and seed the GitOps source
    Flux(FluxArgs),
    /// Install Cluster API, then FluxCD
    All(FluxArgs),
    /// Print the effective settings
    Settings,
    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Version => {
            cli::display_version();
            Ok(())
        }
        Command::Settings => cli::print_settings(args.config.as_deref()),
        command => {
            cli::init_logging(args.debug, args.log_file.as_deref())?;
            match command {
                Command::Capi(cluster) => cli::run_capi(cluster).await,
                Command::Flux(flux) => cli::run_flux(flux, args.config.as_deref()).await,
                Command::All(flux) => cli::run_all(flux, args.config.as_deref()).await,
                Command::Settings | Command::Version => Ok(()),
            }
        }
    }
}
