use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use chainforge_tools::config::redact_url;
use chainforge_tools::logging::init_tracing;
use chainforge_tools::{ExportFormat, ToolchainConfig};

#[derive(Parser)]
#[command(name = "chainforge")]
#[command(about = "Resolve contract toolchain configuration from the environment")]
struct Cli {
    /// Path to a .env file (defaults to .env discovery)
    #[arg(long, global = true, env = "CHAINFORGE_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Overlay file (defaults to ./chainforge.toml when present)
    #[arg(long, global = true, env = "CHAINFORGE_OVERLAY")]
    overlay: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ExportFormat::Json,
            Format::Toml => ExportFormat::Toml,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration with secrets redacted
    Show {
        /// Only show a single network
        #[arg(short, long)]
        network: Option<String>,
    },
    /// Write the configuration in the build tool's schema
    Export {
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check configuration
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = ToolchainConfig::discover(cli.env_file.as_deref(), cli.overlay.as_deref())
        .context("failed to resolve toolchain configuration")?;

    match cli.command {
        Commands::Show { network: None } => {
            config.print_summary();
            Ok(())
        }
        Commands::Show {
            network: Some(name),
        } => {
            let network = config.network(&name)?;
            println!("  Network:             {}", name);
            println!("  Chain ID:            {}", network.chain_id);
            match &network.rpc_url {
                Some(url) => println!("  RPC URL:             {}", redact_url(url)),
                None => println!("  RPC URL:             (in-process)"),
            }
            println!("  Accounts:            {}", network.accounts.len());
            Ok(())
        }
        Commands::Export { format, output } => {
            let rendered = config.render(format.into())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "configuration exported");
                }
                None => println!("{}", rendered),
            }
            Ok(())
        }
        Commands::Validate => {
            config.validate()?;
            println!(
                "Configuration is valid ({} networks, {} explorer keys)",
                config.networks.len(),
                config.explorer_api_keys.len()
            );
            Ok(())
        }
    }
}
