use super::Commands;
use crate::account::AccountStore;
use crate::error::AccountsError;

/// Run one command against the registry and return the text to print.
pub fn handle_command(cmd: Commands, store: &AccountStore) -> Result<String, AccountsError> {
    match cmd {
        Commands::Create { secret, password } => {
            let address = store.create(&secret, &password)?;
            Ok(format!("Account created: {}", address))
        }
        Commands::List => {
            let lines = store.map_to_vec(|account| format!("{}\t{}", account.address(), account.name()));
            Ok(lines.join("\n"))
        }
        Commands::Get { address } => {
            let account = store.get(&address)?;
            Ok(format!(
                "Address: {}\nName: {}\nUUID: {}\nCreated: {}",
                account.address(),
                account.name(),
                account.uuid(),
                account.created_at()
            ))
        }
        Commands::Remove { address } => {
            if store.remove(&address) {
                Ok(format!("Removed {}", address))
            } else {
                Ok(format!("No account {}", address))
            }
        }
        Commands::Last => Ok(store.last_used()),
        Commands::Rename { address, name } => {
            store.get(&address)?.set_name(&name);
            Ok(format!("Renamed {} to '{}'", address, name))
        }
        Commands::Export => serde_json::to_string_pretty(&store.to_serializable())
            .map_err(|e| AccountsError::CorruptState(e.to_string())),
    }
}
