//! CLI command implementations.

pub mod fetch;
pub mod sync;

use clap::Args;
use contentstack_sdk::{Region, Stack, StackConfig, SyncItemType};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before any request is made.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required connection setting was not given.
    #[error("missing {0}: pass --{1}, set {2}, or use --config")]
    MissingSetting(&'static str, &'static str, &'static str),

    /// Sync flags did not name exactly one starting point.
    #[error("choose one of --init, --sync-token or --pagination-token")]
    SyncStart,
}

/// Connection settings shared by every command.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// JSON stack configuration file
    #[arg(global = true, short, long)]
    pub config: Option<PathBuf>,

    /// Stack API key
    #[arg(global = true, long, env = "CONTENTSTACK_API_KEY")]
    pub api_key: Option<String>,

    /// Delivery token
    #[arg(
        global = true,
        long,
        env = "CONTENTSTACK_DELIVERY_TOKEN",
        hide_env_values = true
    )]
    pub delivery_token: Option<String>,

    /// Publishing environment
    #[arg(global = true, short, long, env = "CONTENTSTACK_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Stack region (us, eu, azure-na, azure-eu, gcp-na)
    #[arg(global = true, long)]
    pub region: Option<Region>,

    /// Branch
    #[arg(global = true, short, long)]
    pub branch: Option<String>,
}

/// Sync flags.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Start a fresh sync
    #[arg(long)]
    pub init: bool,

    /// Fetch changes since this sync token
    #[arg(long)]
    pub sync_token: Option<String>,

    /// Resume from this pagination token
    #[arg(long)]
    pub pagination_token: Option<String>,

    /// Only sync this content type (with --init)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Only sync this locale (with --init)
    #[arg(long)]
    pub locale: Option<String>,

    /// Only sync changes after this ISO 8601 date (with --init)
    #[arg(long)]
    pub from_date: Option<String>,

    /// Only sync this kind of change (with --init)
    #[arg(long)]
    pub publish_type: Option<SyncItemType>,
}

/// Builds the stack configuration from a file and/or flags.
///
/// Flags and environment variables override values from the file. The
/// result is validated when the stack is created.
pub fn load_config(args: &ConnectionArgs) -> Result<StackConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => StackConfig::from_json_file(path)?,
        None => StackConfig::new(
            required(&args.api_key, "api key", "api-key", "CONTENTSTACK_API_KEY")?,
            required(
                &args.delivery_token,
                "delivery token",
                "delivery-token",
                "CONTENTSTACK_DELIVERY_TOKEN",
            )?,
            required(
                &args.environment,
                "environment",
                "environment",
                "CONTENTSTACK_ENVIRONMENT",
            )?,
        ),
    };

    if args.config.is_some() {
        if let Some(api_key) = &args.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(token) = &args.delivery_token {
            config.delivery_token = token.clone();
        }
        if let Some(environment) = &args.environment {
            config.environment = environment.clone();
        }
    }
    if let Some(region) = args.region {
        config = config.with_region(region);
    }
    if let Some(branch) = &args.branch {
        config = config.with_branch(branch.clone());
    }

    Ok(config)
}

fn required(
    value: &Option<String>,
    name: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, CliError> {
    value
        .clone()
        .ok_or(CliError::MissingSetting(name, flag, env))
}

/// Connects to the stack described by the arguments.
pub fn connect(args: &ConnectionArgs) -> Result<Stack, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    Ok(Stack::connect(config)?)
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
