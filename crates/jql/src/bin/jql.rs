//! Command line front end for the structured query engine.
//!
//! ```text
//! jql render query.json
//! jql encode "dell laptop"
//! jql decode '"dell laptop"'
//! jql --registry-config groups.json groups
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use helios_jql::clause::Clause;
use helios_jql::config::{CliCommand, CliConfig};
use helios_jql::registry::SearcherGroupType;
use helios_jql::text::{decode, encode_string_value};

fn main() -> Result<()> {
    let config = CliConfig::parse();
    helios_jql::init_logging(&config.log_level);
    debug!(version = helios_jql::VERSION, "Starting jql");

    match &config.command {
        CliCommand::Render { file } => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let clause: Clause = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a valid clause tree", file.display()))?;
            println!("{}", clause);
        }
        CliCommand::Encode { value } => {
            println!("{}", encode_string_value(value));
        }
        CliCommand::Decode { text } => {
            println!("{}", decode(text)?);
        }
        CliCommand::Groups => {
            let registry_config = config.load_registry_config()?;
            for group in SearcherGroupType::all() {
                let ids = registry_config
                    .group_priorities
                    .get(&group)
                    .map(|ids| ids.join(", "))
                    .unwrap_or_default();
                println!("{}: {}", group, ids);
            }
        }
    }

    Ok(())
}
