//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use voxdesk_voice::LiveKitConfig;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// LiveKit credentials used to mint join tokens.
    #[serde(default)]
    pub livekit: LiveKitConfig,

    /// API keys for the LLM, speech and search providers.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment label reported by the settings catalogue.
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxdesk_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Provider API keys. An empty or missing key means "not configured".
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub brave_api_key: Option<String>,
}

impl ProvidersConfig {
    /// Environment variable names paired with the key they fill.
    const VARS: [&'static str; 7] = [
        "OPENAI_API_KEY",
        "GROQ_API_KEY",
        "OPENROUTER_API_KEY",
        "DEEPGRAM_API_KEY",
        "ELEVENLABS_API_KEY",
        "TAVILY_API_KEY",
        "BRAVE_API_KEY",
    ];

    fn slot(&mut self, var: &str) -> Option<&mut Option<String>> {
        match var {
            "OPENAI_API_KEY" => Some(&mut self.openai_api_key),
            "GROQ_API_KEY" => Some(&mut self.groq_api_key),
            "OPENROUTER_API_KEY" => Some(&mut self.openrouter_api_key),
            "DEEPGRAM_API_KEY" => Some(&mut self.deepgram_api_key),
            "ELEVENLABS_API_KEY" => Some(&mut self.elevenlabs_api_key),
            "TAVILY_API_KEY" => Some(&mut self.tavily_api_key),
            "BRAVE_API_KEY" => Some(&mut self.brave_api_key),
            _ => None,
        }
    }

    fn get(&self, var: &str) -> Option<&str> {
        let key = match var {
            "OPENAI_API_KEY" => &self.openai_api_key,
            "GROQ_API_KEY" => &self.groq_api_key,
            "OPENROUTER_API_KEY" => &self.openrouter_api_key,
            "DEEPGRAM_API_KEY" => &self.deepgram_api_key,
            "ELEVENLABS_API_KEY" => &self.elevenlabs_api_key,
            "TAVILY_API_KEY" => &self.tavily_api_key,
            "BRAVE_API_KEY" => &self.brave_api_key,
            _ => return None,
        };
        key.as_deref()
    }

    /// Whether the key named by environment variable `var` has a value.
    pub fn is_configured(&self, var: &str) -> bool {
        self.get(var).is_some_and(|key| !key.trim().is_empty())
    }

    /// Sets the key named by environment variable `var`. Unknown names are ignored.
    pub fn set(&mut self, var: &str, key: impl Into<String>) {
        if let Some(slot) = self.slot(var) {
            *slot = Some(key.into());
        }
    }
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured: Vec<&str> = Self::VARS
            .iter()
            .copied()
            .filter(|var| self.is_configured(var))
            .collect();
        f.debug_struct("ProvidersConfig")
            .field("configured", &configured)
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// Environment variable overrides:
/// - `VOXDESK_HOST` overrides `server.host`
/// - `VOXDESK_PORT` overrides `server.port`
/// - `VOXDESK_ENVIRONMENT` overrides `server.environment`
/// - `VOXDESK_LOG_LEVEL` overrides `logging.level`
/// - `VOXDESK_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET` override `[livekit]`
/// - `<PROVIDER>_API_KEY` (e.g. `GROQ_API_KEY`) overrides `[providers]`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Like [`load_config`], reading overrides through `lookup` instead of the
/// process environment.
pub fn load_config_with(
    path: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(host) = lookup("VOXDESK_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("VOXDESK_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(environment) = lookup("VOXDESK_ENVIRONMENT") {
        config.server.environment = environment;
    }
    if let Some(level) = lookup("VOXDESK_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("VOXDESK_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(url) = lookup("LIVEKIT_URL") {
        config.livekit.url = url;
    }
    if let Some(key) = lookup("LIVEKIT_API_KEY") {
        config.livekit.api_key = key;
    }
    if let Some(secret) = lookup("LIVEKIT_API_SECRET") {
        config.livekit.api_secret = secret;
    }

    for var in ProvidersConfig::VARS {
        if let Some(key) = lookup(var) {
            config.providers.set(var, key);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config_with(None, env(&[])).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.environment, "development");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.livekit.url, voxdesk_voice::DEV_LIVEKIT_URL);
        assert_eq!(config.livekit.token_ttl_seconds, 3600);
        assert!(!config.providers.is_configured("GROQ_API_KEY"));
    }

    #[test]
    fn env_overrides_apply() {
        let config = load_config_with(
            None,
            env(&[
                ("VOXDESK_PORT", "9100"),
                ("VOXDESK_HOST", "0.0.0.0"),
                ("VOXDESK_LOG_JSON", "1"),
                ("LIVEKIT_API_KEY", "prodkey"),
                ("LIVEKIT_API_SECRET", "prodsecret"),
                ("GROQ_API_KEY", "gsk_test"),
            ]),
        )
        .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.logging.json);
        assert_eq!(config.livekit.api_key, "prodkey");
        assert_eq!(config.livekit.api_secret, "prodsecret");
        assert!(config.providers.is_configured("GROQ_API_KEY"));
        assert!(!config.providers.is_configured("OPENAI_API_KEY"));
    }

    #[test]
    fn unparsable_port_override_is_ignored() {
        let config = load_config_with(None, env(&[("VOXDESK_PORT", "eighty")])).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn blank_provider_key_is_not_configured() {
        let mut providers = ProvidersConfig::default();
        providers.set("TAVILY_API_KEY", "  ");
        assert!(!providers.is_configured("TAVILY_API_KEY"));
        providers.set("UNKNOWN_API_KEY", "x");
        assert!(!providers.is_configured("UNKNOWN_API_KEY"));
    }

    #[test]
    fn debug_lists_only_configured_names() {
        let mut providers = ProvidersConfig::default();
        providers.set("DEEPGRAM_API_KEY", "dg-secret-value");
        let rendered = format!("{:?}", providers);
        assert!(rendered.contains("DEEPGRAM_API_KEY"));
        assert!(!rendered.contains("dg-secret-value"));
    }
}
