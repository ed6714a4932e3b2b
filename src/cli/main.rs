//! CLI binary entry point for oecd-loader

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand};
#[cfg(feature = "cli")]
use oecd_loader::cli::commands::diagnose::{DiagnoseArgs, handle_diagnose};
#[cfg(feature = "cli")]
use oecd_loader::cli::commands::init::{InitConfigArgs, handle_init_config};
#[cfg(feature = "cli")]
use oecd_loader::cli::commands::{
    ReportArgs, load::handle_load, pipeline::handle_run, provision::handle_provision,
    publish::handle_publish,
};
#[cfg(feature = "cli")]
use oecd_loader::config::CONFIG_FILENAME;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "oecd-loader")]
#[command(about = "Provision, stage and bulk-load the OECD countries/economy dataset")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Create the schema and tables if they do not exist
    Provision {
        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Upload local data files to the staging bucket
    Publish {
        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Bulk-load every mapped table from the staging bucket
    Load {
        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show the most recent load error recorded for a table
    Diagnose {
        /// Table name, e.g. economies
        table: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Provision, publish and load in one go
    Run {
        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Write a sample configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = CONFIG_FILENAME)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    // A missing .env file is fine; real environment variables win
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config;
    let result = match cli.command {
        Commands::Provision { format } => handle_provision(&ReportArgs { config, format }),
        Commands::Publish { format } => handle_publish(&ReportArgs { config, format }),
        Commands::Load { format } => handle_load(&ReportArgs { config, format }),
        Commands::Diagnose { table, format } => handle_diagnose(&DiagnoseArgs {
            table,
            config,
            format,
        }),
        Commands::Run { format } => handle_run(&ReportArgs { config, format }),
        Commands::InitConfig { path, force } => {
            handle_init_config(&InitConfigArgs { path, force })
        }
    };

    match result {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
