use plugboard_base::{Config, ConfigSection, config_section};
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::NamedTempFile;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ServerConfig {
    bind_addr: String,
    workers: u32,
}

#[config_section("database")]
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct DatabaseConfig {
    host: String,
    port: u16,
    #[serde(default)]
    ssl: bool,
}

#[test]
fn test_config_new() {
    let config = Config::new();
    assert!(config.is_empty());
    assert_eq!(config.len(), 0);
}

#[test]
fn test_config_set_and_get() {
    let mut config = Config::new();
    let server = ServerConfig {
        bind_addr: "127.0.0.1:8080".to_string(),
        workers: 4,
    };
    config.set("server", &server).unwrap();
    assert!(config.contains("server"));
    assert_eq!(config.get::<ServerConfig>("server").unwrap(), server);
}

#[test]
fn test_config_get_missing() {
    let config = Config::new();
    let value: Option<String> = config.get("missing").unwrap();
    assert_eq!(value, None);
    assert!(config.get::<ServerConfig>("missing").is_err());
}

#[test]
fn test_config_section() {
    assert_eq!(DatabaseConfig::key(), "database");
    let config = Config::new().with(
        "database",
        DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            ssl: true,
        },
    );
    let section = config.section::<DatabaseConfig>().unwrap().unwrap();
    assert_eq!(section.host, "localhost");
    assert!(section.ssl);
    assert!(Config::new().section::<DatabaseConfig>().unwrap().is_none());
}

#[test]
fn test_config_parse() {
    let config = Config::parse(
        r#"
    {
        "server": {"bind_addr": "0.0.0.0:80", "workers": 2},
        "database": {"host": "db", "port": 3306}
    }
    "#,
    )
    .unwrap();
    assert_eq!(config.keys().collect::<Vec<_>>(), vec!["database", "server"]);
    let database = config.section::<DatabaseConfig>().unwrap().unwrap();
    assert_eq!(database.port, 3306);
    assert!(!database.ssl);
}

#[test]
fn test_config_parse_invalid_json() {
    assert!(Config::parse(r#"{ "invalid": json }"#).is_err());
}

#[tokio::test]
async fn test_config_parse_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"{"server": {"bind_addr": "127.0.0.1:8080", "workers": 4}}"#,
    )
    .unwrap();
    let config = Config::parse_file(file.path()).await.unwrap();
    let server: ServerConfig = config.get("server").unwrap();
    assert_eq!(server.workers, 4);
}

#[tokio::test]
async fn test_config_parse_file_not_found() {
    assert!(Config::parse_file("nonexistent_file.json").await.is_err());
}

#[test]
fn test_config_merge() {
    let mut base = Config::parse(
        r#"
    {
        "database": {"host": "localhost", "port": 5432},
        "tags": ["web"],
        "name": "old"
    }
    "#,
    )
    .unwrap();
    let overrides = Config::parse(
        r#"
    {
        "database": {"ssl": true},
        "tags": ["monitoring"],
        "name": "new",
        "registry": {"merge": true}
    }
    "#,
    )
    .unwrap();
    base.merge_from(overrides);

    let database = base.section::<DatabaseConfig>().unwrap().unwrap();
    assert_eq!(database.host, "localhost");
    assert!(database.ssl);
    assert_eq!(base.get::<Vec<String>>("tags").unwrap(), vec!["web", "monitoring"]);
    assert_eq!(base.get::<String>("name").unwrap(), "new");
    assert!(base.contains("registry"));
}

#[test]
fn test_config_serialization() {
    let config = Config::new().with("port", 8080u16).with("name", "app");
    let text = serde_json::to_string(&config).unwrap();
    let config: Config = serde_json::from_str(&text).unwrap();
    assert_eq!(config.get::<u16>("port").unwrap(), 8080);
    assert_eq!(config.get::<String>("name").unwrap(), "app");
}
