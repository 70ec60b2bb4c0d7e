use std::io::Write;
use tempfile::NamedTempFile;
use voxdesk_server::config::{load_config_with, ConfigError};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_loads_all_sections_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[server]
host = "0.0.0.0"
port = 9000
environment = "staging"

[logging]
level = "voxdesk_server=debug,info"
json = true

[livekit]
url = "wss://lk.example.com"
api_key = "APIkey"
api_secret = "topsecret"
token_ttl_seconds = 600

[providers]
groq_api_key = "gsk_123"
"#
    )
    .unwrap();

    let config = load_config_with(file.path().to_str(), no_env).unwrap();

    assert_eq!(config.server.host.to_string(), "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.environment, "staging");
    assert_eq!(config.logging.level, "voxdesk_server=debug,info");
    assert!(config.logging.json);
    assert_eq!(config.livekit.url, "wss://lk.example.com");
    assert_eq!(config.livekit.api_key, "APIkey");
    assert_eq!(config.livekit.api_secret, "topsecret");
    assert_eq!(config.livekit.token_ttl_seconds, 600);
    assert!(config.providers.is_configured("GROQ_API_KEY"));
    assert!(!config.providers.is_configured("OPENAI_API_KEY"));
}

#[test]
fn test_env_overrides_file_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 9000\n\n[livekit]\napi_secret = \"from-file\"").unwrap();

    let config = load_config_with(file.path().to_str(), |name| match name {
        "VOXDESK_PORT" => Some("9001".to_string()),
        "LIVEKIT_API_SECRET" => Some("from-env".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.server.port, 9001);
    assert_eq!(config.livekit.api_secret, "from-env");
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config = load_config_with(path.to_str(), no_env).unwrap();
    assert_eq!(config.server.port, 8000);
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[server\nport = ").unwrap();

    let err = load_config_with(file.path().to_str(), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
