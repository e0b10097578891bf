//! docshift Command-Line Client
//!
//! Applies, rolls back and reports versioned migration scripts.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use docshift_core::catalog::DEFAULT_EXTENSION;
use docshift_core::config::{DEFAULT_CONNECTION_URI, DEFAULT_SCRIPTS_DIR};
use docshift_core::executor::DEFAULT_SHELL;
use docshift_core::store::DEFAULT_COLLECTION;
use docshift_core::{Migrator, MigratorConfig};
use std::path::PathBuf;

/// docshift Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "docshift")]
#[command(version, about = "Versioned migration scripts for document stores")]
pub struct Args {
    /// Directory containing migration scripts
    #[arg(short, long, default_value = DEFAULT_SCRIPTS_DIR)]
    pub scripts_dir: PathBuf,

    /// Target database the migrations belong to
    #[arg(short, long)]
    pub namespace: String,

    /// Collection holding migration records
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Script file extension
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Program used to run each script
    #[arg(long, default_value = DEFAULT_SHELL)]
    pub shell: String,

    /// Connection URI of the target store
    #[arg(long, default_value = DEFAULT_CONNECTION_URI)]
    pub uri: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply all pending up scripts
    Up,
    /// Roll back all applied migrations that have a down script
    Down,
    /// Print the latest applied version
    Version,
}

impl Args {
    /// Convert to a migrator configuration.
    pub fn into_config(self) -> MigratorConfig {
        MigratorConfig::new(self.namespace)
            .with_collection(self.collection)
            .with_scripts_dir(self.scripts_dir)
            .with_extension(self.extension)
            .with_shell(self.shell)
            .with_connection_uri(self.uri)
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docshift=info,docshift_core=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let command = args.command;
    let config = args.into_config();

    tracing::debug!(
        namespace = %config.namespace,
        scripts_dir = %config.scripts_dir.display(),
        "configuration loaded"
    );

    let mut migrator = Migrator::from_config(&config)?;

    match command {
        Command::Up => migrator.up()?,
        Command::Down => migrator.down()?,
        Command::Version => match migrator.latest_version()? {
            Some(version) => println!("{}", version),
            None => println!("none"),
        },
    }

    Ok(())
}
