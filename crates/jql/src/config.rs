//! Configuration for the registry and the `jql` binary.
//!
//! [`RegistryConfig`] holds the per-group searcher priority lists used when
//! ordering searchers for display. It can be built in code, loaded from a
//! JSON file, or left at its default built-in ordering.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JQL_LOG_LEVEL` | info | Log level |
//! | `JQL_REGISTRY_CONFIG` | (none) | Path to a registry configuration JSON file |
//!
//! # Example
//!
//! ```rust
//! use helios_jql::config::RegistryConfig;
//! use helios_jql::registry::SearcherGroupType;
//!
//! let config = RegistryConfig::default();
//! assert_eq!(config.priority(SearcherGroupType::Catalog, "vendor"), Some(0));
//! assert_eq!(config.priority(SearcherGroupType::Catalog, "unknown"), None);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::SearcherGroupType;

/// Searcher ordering configuration for the search handler registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Searcher ids in display order, per group.
    #[serde(default)]
    pub group_priorities: BTreeMap<SearcherGroupType, Vec<String>>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let mut group_priorities = BTreeMap::new();
        group_priorities.insert(SearcherGroupType::Text, ids(&["text"]));
        group_priorities.insert(SearcherGroupType::Context, ids(&["catalog", "category"]));
        group_priorities.insert(
            SearcherGroupType::Catalog,
            ids(&["vendor", "manufacturer", "sku"]),
        );
        group_priorities.insert(
            SearcherGroupType::Asset,
            ids(&["status", "owner", "location", "assignee"]),
        );
        group_priorities.insert(
            SearcherGroupType::Date,
            ids(&["created", "updated", "acquired", "retired"]),
        );
        group_priorities.insert(SearcherGroupType::Custom, Vec::new());
        Self { group_priorities }
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl RegistryConfig {
    /// Creates a configuration with no priorities; searchers keep discovery order.
    pub fn unordered() -> Self {
        Self {
            group_priorities: BTreeMap::new(),
        }
    }

    /// Sets the priority list for one group.
    pub fn with_priorities<I, S>(mut self, group: SearcherGroupType, searcher_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_priorities
            .insert(group, searcher_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the position of `searcher_id` in the group's priority list.
    pub fn priority(&self, group: SearcherGroupType, searcher_id: &str) -> Option<usize> {
        self.group_priorities
            .get(&group)
            .and_then(|ids| ids.iter().position(|id| id == searcher_id))
    }

    /// Rejects priority lists that mention the same searcher twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (group, searcher_ids) in &self.group_priorities {
            let mut seen = HashSet::new();
            for id in searcher_ids {
                if id.trim().is_empty() {
                    return Err(ConfigError::Invalid {
                        message: format!("group '{}' contains an empty searcher id", group),
                    });
                }
                if !seen.insert(id.as_str()) {
                    return Err(ConfigError::Invalid {
                        message: format!("group '{}' lists searcher '{}' more than once", group, id),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Command line configuration for the `jql` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "jql")]
#[command(about = "Render, encode and inspect structured asset queries")]
pub struct CliConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "JQL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Registry configuration JSON file.
    #[arg(long, env = "JQL_REGISTRY_CONFIG")]
    pub registry_config: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Subcommands of the `jql` binary.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Render a clause tree stored as JSON to canonical query text.
    Render {
        /// Path to the clause JSON file.
        file: PathBuf,
    },
    /// Encode a value as a query token, quoting and escaping if needed.
    Encode {
        /// The raw value.
        value: String,
    },
    /// Decode a quoted or escaped query token.
    Decode {
        /// The encoded text.
        text: String,
    },
    /// Print the configured searcher priorities per group.
    Groups,
}

impl CliConfig {
    /// Loads the registry configuration, falling back to the default.
    pub fn load_registry_config(&self) -> Result<RegistryConfig, ConfigError> {
        match &self.registry_config {
            Some(path) => RegistryConfig::from_json_file(path),
            None => Ok(RegistryConfig::default()),
        }
    }
}
