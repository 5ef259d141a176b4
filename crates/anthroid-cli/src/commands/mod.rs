use clap::{Parser, Subcommand};
use std::path::PathBuf;

use anthroid_config::{AnthroidConfig, ConfigLoader};
use anthroid_core::AnthroidError;
use anthroid_device::DeviceTools;

mod click;
mod serve;

/// Android tools MCP bridge and install-dialog auto-clicker
#[derive(Parser)]
#[command(name = "anthroid", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to anthroid.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,
    /// Watch the screen and confirm APK install dialogs
    Click {
        /// How long to watch, in seconds (default: clicker.timeout_secs, 120)
        timeout: Option<u64>,
        /// Drive the UI through the local shell (running on the device)
        #[arg(long, conflicts_with = "serial")]
        local: bool,
        /// adb serial of the device to drive
        #[arg(short, long)]
        serial: Option<String>,
    },
    /// Print the advertised tool descriptors as JSON
    Tools,
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anthroid_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };

        // stdout carries the JSON-RPC stream, so logs always go to stderr
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
        if config.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_target(true)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }

        match self.command {
            Commands::Serve => serve::cmd_serve(config).await,
            Commands::Click {
                timeout,
                local,
                serial,
            } => click::cmd_click(config, timeout, local, serial).await,
            Commands::Tools => Self::cmd_tools(&config),
            Commands::Config { json } => Self::cmd_config(&config, json),
        }
    }

    fn cmd_tools(config: &AnthroidConfig) -> anthroid_core::Result<()> {
        let tools = DeviceTools::definitions(config.bridge.enabled);
        println!("{}", serde_json::to_string_pretty(&tools)?);
        Ok(())
    }

    fn cmd_config(config: &AnthroidConfig, json: bool) -> anthroid_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config).map_err(|e| AnthroidError::Config(e.to_string()))?
            );
        }
        Ok(())
    }
}
