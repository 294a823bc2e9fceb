//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `EDULINK_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `EDULINK_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `EDULINK_AUTH__ACCESS_TOKEN_TTL=30m` sets the `auth.access_token_ttl` field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying the config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "EDULINK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation, except the
/// token secrets which must be provided for the configuration to validate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration (secrets, token lifetimes, cookies, password rules)
    pub auth: AuthConfig,
    /// External media-storage collaborator configuration
    pub media: MediaConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            media: MediaConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string (e.g., "sqlite://edulink.db")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://edulink.db".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Secret key for signing access tokens
    #[serde(skip_serializing)]
    pub access_token_secret: String,
    /// Secret key for signing refresh tokens. Must differ from the access
    /// token secret so one token class cannot be replayed as the other.
    #[serde(skip_serializing)]
    pub refresh_token_secret: String,
    /// Access token lifetime (short, minutes)
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (long, days)
    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,
    /// Allow new users to self-register
    pub allow_registration: bool,
    /// Token cookie configuration
    pub session: SessionConfig,
    /// Password validation rules
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(), // Must be set by the operator
            refresh_token_secret: String::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            allow_registration: true,
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

/// Token cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Cookie name for the access token
    pub access_cookie_name: String,
    /// Cookie name for the refresh token
    pub refresh_cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only). Applied uniformly to every
    /// cookie-setting endpoint.
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("Strict", "Lax", or "None")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_cookie_name: "accessToken".to_string(),
            refresh_cookie_name: "refreshToken".to_string(),
            cookie_secure: true,
            cookie_same_site: "Strict".to_string(),
        }
    }
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB, secure for production)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2, secure for production)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// External media-storage collaborator configuration.
///
/// Uploads degrade to a null result on failure; they are never retried by
/// this service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Enable uploads to the external media store
    pub enabled: bool,
    /// Upload endpoint of the media store
    pub upload_url: Option<Url>,
    /// Bearer token for the media store, if it requires one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-upload timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            upload_url: None,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<String>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: true,
        }
    }
}

impl Config {
    /// Load configuration from the YAML file and environment variables.
    pub fn load(args: &Args) -> Result<Self, Error> {
        let figment = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("EDULINK_").split("__"));

        let mut config: Config = figment.extract().map_err(|e| Error::Internal {
            operation: format!("load configuration: {e}"),
        })?;

        // DATABASE_URL is the conventional override and wins over everything
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// The two token secrets are required and must be distinct: a shared
    /// secret would let a refresh token verify as an access token.
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.access_token_secret.is_empty() {
            return Err(Error::Internal {
                operation: "validate configuration: auth.access_token_secret is not set".to_string(),
            });
        }
        if self.auth.refresh_token_secret.is_empty() {
            return Err(Error::Internal {
                operation: "validate configuration: auth.refresh_token_secret is not set".to_string(),
            });
        }
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(Error::Internal {
                operation: "validate configuration: access and refresh token secrets must differ".to_string(),
            });
        }
        if self.auth.access_token_secret.len() < 32 || self.auth.refresh_token_secret.len() < 32 {
            tracing::warn!("Token secrets are shorter than the recommended 32 bytes");
        }
        if self.media.enabled && self.media.upload_url.is_none() {
            return Err(Error::Internal {
                operation: "validate configuration: media.enabled requires media.upload_url".to_string(),
            });
        }
        Ok(())
    }

    /// The address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                access_token_secret: "access-secret-for-tests-0123456789abcdef".to_string(),
                refresh_token_secret: "refresh-secret-for-tests-0123456789abcdef".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.auth.refresh_token_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.auth.session.access_cookie_name, "accessToken");
        assert!(config.auth.session.cookie_secure);
    }

    #[test]
    fn test_validate_accepts_distinct_secrets() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_secrets() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = valid_config();
        config.auth.refresh_token_secret = config.auth.access_token_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_media_without_url() {
        let mut config = valid_config();
        config.media.enabled = true;
        config.media.upload_url = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_parsing() {
        let figment = Figment::new().merge(Yaml::string(
            r#"
            port: 9090
            auth:
              access_token_secret: "yaml-access-secret-0123456789abcdef"
              refresh_token_secret: "yaml-refresh-secret-0123456789abcdef"
              access_token_ttl: 30m
              refresh_token_ttl: 14d
            "#,
        ));

        let config: Config = figment.extract().unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.auth.refresh_token_ttl, Duration::from_secs(14 * 24 * 3600));
        assert!(config.validate().is_ok());
    }
}
