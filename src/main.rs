//! haven: consent-gated companion chat
//!
//! Usage:
//!   haven serve                      → start the gateway on :18790
//!   haven serve --offline            → gateway with echoed replies (no provider keys)
//!   haven chat --url http://host:18790 → terminal chat against a gateway
//!   haven config                     → print the default haven.toml
//!   haven version                    → show version

mod chat;
mod logging;

use clap::{Parser, Subcommand};
use haven_core::{BindMode, HavenConfig};
use haven_gateway::{start_gateway, ExtendedConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "haven",
    about = "Consent-gated companion chat",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML). Defaults to $HAVEN_CONFIG, then ./haven.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat gateway
    Serve {
        /// Port for the gateway server (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Bind mode: lan or loopback (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
        /// Echo conversation turns instead of calling a provider
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Chat with a running gateway in the terminal
    Chat {
        /// Gateway base URL
        #[arg(short, long, default_value = "http://127.0.0.1:18790")]
        url: String,
        /// Reply model (default: the server's)
        #[arg(short, long)]
        model: Option<String>,
        /// Companion persona, First-Gender-Ethnicity-Generation
        #[arg(short, long)]
        companion: Option<String>,
    },
    /// Print the default config as TOML
    Config,
    /// Show version
    Version,
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| std::env::var("HAVEN_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("haven.toml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            port,
            bind,
            offline,
        } => {
            let _guard = logging::init("haven=info,tower_http=info", cli.log_file.as_deref())?;

            let mut haven = HavenConfig::load(&config_path(&cli)).with_env_overrides();
            if let Some(port) = port {
                haven.gateway.port = *port;
            }
            if let Some(bind) = bind {
                haven.gateway.bind = BindMode::parse(bind);
            }

            let config = ExtendedConfig {
                haven,
                offline: *offline,
                ..ExtendedConfig::default()
            }
            .with_env_keys();
            start_gateway(config).await?;
        }

        Commands::Chat {
            url,
            model,
            companion,
        } => {
            // keep the terminal for the conversation
            let _guard = logging::init("haven=warn", cli.log_file.as_deref())?;
            let haven = HavenConfig::load(&config_path(&cli));
            let timeout = Duration::from_secs(haven.llm.request_timeout_secs + 10);
            chat::run(url, model.clone(), companion.clone(), timeout).await?;
        }

        Commands::Config => {
            print!("{}", HavenConfig::default().to_toml());
        }

        Commands::Version => {
            println!("haven v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
