//! vervids CLI - version control for creative project files and their assets

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod system_config;
mod util;

/// vervids - Named snapshots of a project file and every asset it references
#[derive(Parser)]
#[command(name = "vervids")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a project file (creates version 0)
    Init {
        /// Project file to track
        file: PathBuf,
        /// Replace an existing project record next to the file
        #[arg(short, long)]
        force: bool,
    },
    /// Record a new version
    Commit {
        /// Commit message
        message: String,
        /// Project file to commit (default: the last committed path)
        file: Option<PathBuf>,
    },
    /// Show version history
    Log {
        /// Number of versions to show (default: 20)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one version in detail
    Show {
        /// Version number (e.g. 3 or v003)
        version: String,
        /// List the version's assets and changes
        #[arg(short, long)]
        assets: bool,
    },
    /// List projects in the configured storage
    Projects,
    /// Select the project used outside of project directories
    Use {
        /// Path to a project's .vervids/config.json (or its directory)
        config: PathBuf,
    },
    /// Remove a version from history (numbers are not reused)
    Remove {
        /// Version number
        version: String,
    },
    /// Drop versions whose stored project file is missing
    Prune,
    /// Restore a version into a directory
    Pull {
        /// Version number
        version: String,
        /// Output directory (default: ./<project>_vNNN)
        out: Option<PathBuf>,
    },
    /// Delete the project's stored versions and local metadata
    Delete {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show system configuration
    Config {
        /// Print the config file location
        #[arg(long)]
        path: bool,
        /// Print the configuration currently in effect
        #[arg(long, conflicts_with = "path")]
        effective: bool,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { file, force } => cmd::init::run(&file, force),
        Commands::Commit { message, file } => cmd::commit::run(&message, file),
        Commands::Log { limit } => cmd::log::run(limit),
        Commands::Show { version, assets } => cmd::show::run(&version, assets),
        Commands::Projects => cmd::projects::run(),
        Commands::Use { config } => cmd::use_project::run(&config),
        Commands::Remove { version } => cmd::remove::run(&version),
        Commands::Prune => cmd::prune::run(),
        Commands::Pull { version, out } => cmd::pull::run(&version, out),
        Commands::Delete { yes } => cmd::delete::run(yes),
        Commands::Config { path, effective } => cmd::config::run(path, effective),
    }
}
