//! Application configuration loaded from environment variables.

use std::time::Duration;

use application::weather::DEFAULT_FORECAST_TTL;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Key used to verify access token signatures.
#[derive(Clone, PartialEq, Eq)]
pub enum JwtKey {
    /// Shared secret for HS256 tokens.
    Secret(String),

    /// PEM encoded RSA public key for RS256 tokens.
    RsaPublicKeyPem(String),
}

impl std::fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtKey::Secret(_) => f.write_str("Secret(..)"),
            JwtKey::RsaPublicKeyPem(_) => f.write_str("RsaPublicKeyPem(..)"),
        }
    }
}

/// Access token validation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Bearer tokens are rejected when no key is configured.
    pub key: Option<JwtKey>,
    pub issuer: Option<String>,
    pub audience: Option<String>,

    /// Claim holding the caller's permissions.
    pub permissions_claim: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            key: None,
            issuer: None,
            audience: None,
            permissions_claim: DEFAULT_PERMISSIONS_CLAIM.to_string(),
        }
    }
}

const DEFAULT_PERMISSIONS_CLAIM: &str = "permissions";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `FORECAST_CACHE_TTL_SECS`: forecast cache lifetime (default: `60`)
/// - `WEATHER_API_BASE_URL`: forecast API root (default: OpenWeatherMap)
/// - `WEATHER_API_KEY`: forecast API key; static forecasts when unset
/// - `AUTH_JWT_SECRET`: HS256 token secret
/// - `AUTH_JWT_PUBLIC_KEY_PEM`: RS256 public key, preferred over the secret
/// - `AUTH_ISSUER` / `AUTH_AUDIENCE`: required `iss` and `aud` when set
/// - `AUTH_PERMISSIONS_CLAIM`: permissions claim name (default: `permissions`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub forecast_cache_ttl: Duration,
    pub weather_api_base_url: String,
    pub weather_api_key: Option<String>,
    pub auth: AuthSettings,
}

const DEFAULT_WEATHER_API_BASE_URL: &str = "https://api.openweathermap.org";

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: non_empty("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            forecast_cache_ttl: non_empty("FORECAST_CACHE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.forecast_cache_ttl),
            weather_api_base_url: non_empty("WEATHER_API_BASE_URL")
                .unwrap_or(defaults.weather_api_base_url),
            weather_api_key: non_empty("WEATHER_API_KEY"),
            auth: AuthSettings {
                key: non_empty("AUTH_JWT_PUBLIC_KEY_PEM")
                    .map(JwtKey::RsaPublicKeyPem)
                    .or_else(|| non_empty("AUTH_JWT_SECRET").map(JwtKey::Secret)),
                issuer: non_empty("AUTH_ISSUER"),
                audience: non_empty("AUTH_AUDIENCE"),
                permissions_claim: non_empty("AUTH_PERMISSIONS_CLAIM")
                    .unwrap_or(defaults.auth.permissions_claim),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            forecast_cache_ttl: DEFAULT_FORECAST_TTL,
            weather_api_base_url: DEFAULT_WEATHER_API_BASE_URL.to_string(),
            weather_api_key: None,
            auth: AuthSettings::default(),
        }
    }
}
