//! Loading registry configuration from disk.

use std::io::Write;

use helios_jql::config::RegistryConfig;
use helios_jql::error::ConfigError;
use helios_jql::registry::SearcherGroupType;
use tempfile::NamedTempFile;

// ============================================================================
// Helper Functions
// ============================================================================

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"{
            "group_priorities": {
                "asset": ["location", "status"],
                "date": ["acquired"]
            }
        }"#,
    );

    let config = RegistryConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.priority(SearcherGroupType::Asset, "location"), Some(0));
    assert_eq!(config.priority(SearcherGroupType::Asset, "status"), Some(1));
    assert_eq!(config.priority(SearcherGroupType::Asset, "owner"), None);
    assert_eq!(config.priority(SearcherGroupType::Text, "text"), None);
}

#[test]
fn test_empty_object_means_unordered() {
    let file = write_config("{}");
    let config = RegistryConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config, RegistryConfig::unordered());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let err = RegistryConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn test_malformed_json() {
    let file = write_config(r#"{"group_priorities": ["#);
    let err = RegistryConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_unknown_group() {
    let file = write_config(r#"{"group_priorities": {"finance": ["budget"]}}"#);
    let err = RegistryConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

/// Files that parse but repeat a searcher are rejected.
#[test]
fn test_duplicate_searcher_rejected() {
    let file = write_config(r#"{"group_priorities": {"asset": ["owner", "owner"]}}"#);
    let err = RegistryConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}
