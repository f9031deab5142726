mod commands;
mod dev;

use anyhow::Result;
use clap::{Parser, Subcommand};
use skyport::{Config, Target};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "skyport")]
#[command(version, about = "Skyport CLI - file-based serverless functions", long_about = None)]
struct Cli {
    /// Project root (where skyport.toml and functions/ live)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build deployables for the configured target
    Build {
        /// Deployment target: aws-lambda or cloudflare-workers
        #[arg(short, long)]
        target: Option<Target>,

        /// Output directory (default from skyport.toml)
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Start the development router with hot reload
    Dev {
        /// Port to run the server on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Do not rescan when files change
        #[arg(long)]
        no_watch: bool,
    },

    /// List discovered routes and subscribers
    Routes {
        /// Print the discovery as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load_from_root(&cli.root)?;

    // Execute command
    match cli.command {
        Commands::Build { target, out } => {
            if let Some(target) = target {
                config.build.target = target;
            }
            if let Some(out) = out {
                config.build.output_dir = out;
            }
            commands::build::execute(&cli.root, config)?;
        }
        Commands::Dev {
            port,
            host,
            no_watch,
        } => {
            if let Some(port) = port {
                config.dev.port = port;
            }
            if let Some(host) = host {
                config.dev.host = host;
            }
            if no_watch {
                config.dev.hot_reload = false;
            }
            commands::dev::execute(&cli.root, config)?;
        }
        Commands::Routes { json } => {
            commands::routes::execute(&cli.root, &config, json)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyport=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
