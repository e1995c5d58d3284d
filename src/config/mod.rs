use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::auth::generate_secret;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub words: WordsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to make cross-origin requests. Empty or `"*"` allows any.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:wordhoard.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Token lifetime, e.g. "7d", "12h", "30m", "45s" or plain seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: default_token_ttl(),
        }
    }
}

fn default_token_ttl() -> String {
    "7d".to_string()
}

impl AuthConfig {
    /// The configured signing secret, or a freshly generated one.
    ///
    /// A generated secret only lives as long as the process, so every restart
    /// invalidates outstanding tokens.
    pub fn signing_secret(&self) -> String {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                warn!("No JWT secret configured; generated a random one for this process");
                generate_secret()
            }
        }
    }

    pub fn token_ttl(&self) -> Result<chrono::Duration> {
        parse_duration(&self.token_ttl)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordsConfig {
    /// Only the owner of a word may update or delete it
    #[serde(default = "default_enforce_owner")]
    pub enforce_owner_on_mutation: bool,
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            enforce_owner_on_mutation: default_enforce_owner(),
        }
    }
}

fn default_enforce_owner() -> bool {
    true
}

/// Parse a duration such as `7d`, `12h`, `30m`, `45s` or `3600`
pub fn parse_duration(input: &str) -> Result<chrono::Duration> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Duration is empty");
    }

    let (digits, unit) = match input.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => input.split_at(idx),
        None => (input, "s"),
    };

    let value: i64 = digits
        .parse()
        .with_context(|| format!("Invalid duration: {}", input))?;

    let duration = match unit {
        "s" => chrono::Duration::try_seconds(value),
        "m" => chrono::Duration::try_minutes(value),
        "h" => chrono::Duration::try_hours(value),
        "d" => chrono::Duration::try_days(value),
        "w" => chrono::Duration::try_weeks(value),
        other => bail!("Unknown duration unit '{}' in '{}'", other, input),
    };
    let Some(duration) = duration else {
        bail!("Duration out of range: {}", input);
    };

    if duration <= chrono::Duration::zero() {
        bail!("Duration must be positive: {}", input);
    }

    Ok(duration)
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override file values with `WORDHOARD_*` environment variables.
    ///
    /// The lookup is injected so tests do not have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WORDHOARD_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = lookup("WORDHOARD_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(ttl) = lookup("WORDHOARD_JWT_EXPIRE") {
            self.auth.token_ttl = ttl;
        }
        if let Some(host) = lookup("WORDHOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("WORDHOARD_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid WORDHOARD_PORT: {}", port))?;
        }
        if let Some(origins) = lookup("WORDHOARD_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        self.auth
            .token_ttl()
            .context("Invalid auth.token_ttl")?;
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("7d").unwrap(), chrono::Duration::days(7));
        assert_eq!(parse_duration("12h").unwrap(), chrono::Duration::hours(12));
        assert_eq!(parse_duration("30m").unwrap(), chrono::Duration::minutes(30));
        assert_eq!(parse_duration("45s").unwrap(), chrono::Duration::seconds(45));
        assert_eq!(parse_duration("3600").unwrap(), chrono::Duration::hours(1));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("5y").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("99999999999999999d").is_err());
        assert!(parse_duration("99999999999999999w").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.token_ttl().unwrap(), chrono::Duration::days(7));
        assert!(config.words.enforce_owner_on_mutation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080
            cors_origins = ["http://localhost:3000"]

            [words]
            enforce_owner_on_mutation = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert!(!config.words.enforce_owner_on_mutation);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WORDHOARD_DATABASE_URL", "sqlite::memory:"),
            ("WORDHOARD_JWT_SECRET", "s3cret"),
            ("WORDHOARD_JWT_EXPIRE", "1h"),
            ("WORDHOARD_PORT", "9000"),
            ("WORDHOARD_CORS_ORIGINS", "http://a.test, http://b.test,"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.auth.signing_secret(), "s3cret");
        assert_eq!(config.auth.token_ttl().unwrap(), chrono::Duration::hours(1));
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "WORDHOARD_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_generated_secret_when_missing() {
        let config = Config::default();
        let secret = config.auth.signing_secret();
        assert_eq!(secret.len(), 64);
    }
}
