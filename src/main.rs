use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use local_accounts::cli::{accounts::handle_command, Cli};
use local_accounts::config::AccountsConfig;
use local_accounts::{AccountStore, AccountsError, LocalStore, SledMedium, StoreOptions};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber before anything logs. Returns a handle for applying
/// the configured level once the config is read, or `None` when `RUST_LOG`
/// already decides the filter.
fn init_tracing() -> Option<FilterHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let overridable = from_env.is_none();
    let (filter, handle) = reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
    overridable.then_some(handle)
}

fn apply_log_level(handle: Option<FilterHandle>, level: &str) {
    if let Some(handle) = handle {
        if let Err(e) = handle.reload(EnvFilter::new(level)) {
            warn!("Could not apply log level '{}': {}", level, e);
        }
    }
}

fn run(cli: Cli, config: &AccountsConfig) -> Result<String, AccountsError> {
    let medium = SledMedium::open(&config.storage.path)?;
    let storage = Arc::new(LocalStore::with_key(medium, &config.storage.key));
    let store = AccountStore::open(storage, StoreOptions::from(config))?;

    let output = handle_command(cli.command, &store)?;
    store.flush()?;
    Ok(output)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = init_tracing();

    let config = match AccountsConfig::load_or_create(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    apply_log_level(filter, &config.log_level);

    match run(cli, &config) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
