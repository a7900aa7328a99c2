//! Contentstack CLI
//!
//! Command-line access to the Contentstack Content Delivery API.
//!
//! # Commands
//!
//! - `entry` - Fetch a single entry
//! - `entries` - Query the entries of a content type
//! - `asset` / `assets` - Fetch or list assets
//! - `content-types` - List content types
//! - `sync` - Run a sync and print the items and the next sync token

mod commands;

use clap::{Parser, Subcommand};
use commands::{ConnectionArgs, SyncArgs};
use tracing_subscriber::EnvFilter;

/// Contentstack delivery command-line client.
#[derive(Parser)]
#[command(name = "contentstack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single entry
    Entry {
        /// Content type uid
        content_type: String,

        /// Entry uid
        uid: String,

        /// Locale code
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Query the entries of a content type
    Entries {
        /// Content type uid
        content_type: String,

        /// Maximum number of entries
        #[arg(long)]
        limit: Option<u32>,

        /// Number of entries to skip
        #[arg(long)]
        skip: Option<u32>,

        /// Locale code
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Fetch a single asset
    Asset {
        /// Asset uid
        uid: String,
    },

    /// List assets
    Assets {
        /// Maximum number of assets
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List content types
    ContentTypes,

    /// Run a sync and print the items and the next sync token
    Sync(SyncArgs),

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Entry {
            content_type,
            uid,
            locale,
        } => {
            let stack = commands::connect(&cli.connection)?;
            commands::fetch::entry(&stack, &content_type, &uid, locale)?;
        }
        Commands::Entries {
            content_type,
            limit,
            skip,
            locale,
        } => {
            let stack = commands::connect(&cli.connection)?;
            commands::fetch::entries(&stack, &content_type, limit, skip, locale)?;
        }
        Commands::Asset { uid } => {
            let stack = commands::connect(&cli.connection)?;
            commands::fetch::asset(&stack, &uid)?;
        }
        Commands::Assets { limit } => {
            let stack = commands::connect(&cli.connection)?;
            commands::fetch::assets(&stack, limit)?;
        }
        Commands::ContentTypes => {
            let stack = commands::connect(&cli.connection)?;
            commands::fetch::content_types(&stack)?;
        }
        Commands::Sync(args) => {
            let stack = commands::connect(&cli.connection)?;
            commands::sync::run(&stack, &args)?;
        }
        Commands::Version => {
            println!("Contentstack CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("User agent: {}", contentstack_sdk::USER_AGENT);
        }
    }

    Ok(())
}
