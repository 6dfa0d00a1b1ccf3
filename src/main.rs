//! Build Relay - local build orchestration with live progress streaming.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use build_relay::config::{ConfigLoader, ServerConfig};
use build_relay::display;
use build_relay::server::RelayServer;
use build_relay::shell::HostPlatform;

#[derive(Parser)]
#[command(
    name = "build-relay",
    about = "Run project build scripts and stream their progress to a browser",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configurator UI and the build API.
    Serve {
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
        /// Project root containing the build scripts.
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Read configuration from this file only.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<ServerConfig, build_relay::config::ConfigError> {
    let loader = match path {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let loaded = loader.load()?;
    match &loaded.source {
        Some(source) => tracing::info!(path = %source.display(), "Loaded relay config"),
        None => tracing::info!("No relay config file found, using defaults"),
    }
    Ok(loaded.config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            host,
            port,
            root,
            config,
        } => {
            let mut config = match load_config(config) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load configuration");
                    return ExitCode::FAILURE;
                }
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(root) = root {
                config.project_root = root;
            }

            let server = RelayServer::new(config);
            let cancel = server.cancel_token();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    return;
                }
                tracing::info!("Interrupt received");
                cancel.cancel();
            });

            display::print_banner(
                &server.address(),
                &server.config().project_root,
                HostPlatform::current().os_label(),
            );

            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "Server failed");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}
