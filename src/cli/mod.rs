pub mod accounts;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "local-accounts")]
#[command(about = "Local account registry", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "accounts.toml")]
    pub config: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Import a 0x-prefixed hex private key
    Create {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        password: String,
    },
    /// List all accounts in registry order
    List,
    /// Show one account (marks it as last used)
    Get { address: String },
    /// Remove an account
    Remove { address: String },
    /// Print the last used address
    Last,
    /// Set an account's display name
    Rename { address: String, name: String },
    /// Dump the registry as JSON
    Export,
}
