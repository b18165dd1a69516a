//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::net::{IpAddr, SocketAddr};
use std::num::{NonZeroU32, NonZeroU64};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mercato";
const ENV_PREFIX: &str = "MERCATO";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_LISTING_TTL_SECS: u64 = 3600;
const DEFAULT_CACHE_DETAIL_TTL_SECS: u64 = 3600;
const DEFAULT_CACHE_POOL_SIZE: u32 = 16;

/// Command-line arguments for the mercato binary.
#[derive(Debug, Parser)]
#[command(name = "mercato", version, about = "Mercato sales ledger server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MERCATO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle the read cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the Redis connection URL backing the read cache.
    #[arg(long = "cache-url", value_name = "URL")]
    pub cache_url: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

impl CliArgs {
    fn overrides(&self) -> Overrides {
        match &self.command {
            Some(Command::Serve(args)) => args.overrides.clone(),
            Some(Command::Migrate(args)) => args.overrides.clone(),
            None => Overrides::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub url: Option<String>,
    pub listing_ttl_secs: NonZeroU64,
    pub detail_ttl_secs: NonZeroU64,
    pub pool_size: NonZeroU32,
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        CacheConfig {
            enabled: settings.enabled,
            url: settings.url.clone(),
            listing_ttl: Duration::from_secs(settings.listing_ttl_secs.get()),
            detail_ttl: Duration::from_secs(settings.detail_ttl_secs.get()),
            pool_size: settings.pool_size.get(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Tokens accepted by the API; issuance lives with the external auth
    /// service.
    pub api_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCache {
    enabled: Option<bool>,
    url: Option<String>,
    listing_ttl_secs: Option<u64>,
    detail_ttl_secs: Option<u64>,
    pool_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuth {
    api_tokens: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLogging {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    cache: RawCache,
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    logging: RawLogging,
}

/// Parse CLI arguments and load settings with layered precedence.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli = CliArgs::parse();
    let settings = load_settings(&cli)?;
    Ok((cli, settings))
}

fn load_settings(cli: &CliArgs) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = &cli.config_file {
        builder = builder.add_source(File::from(path.clone()).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let raw: RawSettings = config.try_deserialize()?;
    resolve(raw, cli.overrides())
}

fn resolve(raw: RawSettings, overrides: Overrides) -> Result<Settings, ConfigError> {
    let host = overrides
        .server_host
        .or(raw.server.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = overrides.server_port.or(raw.server.port).unwrap_or(DEFAULT_PORT);
    let ip: IpAddr = host
        .parse()
        .map_err(|_| ConfigError::invalid(format!("`{host}` is not a valid listener host")))?;

    let max_connections = overrides
        .database_max_connections
        .or(raw.database.max_connections)
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_connections)
        .ok_or_else(|| ConfigError::invalid("database.max_connections must be positive"))?;

    let listing_ttl = NonZeroU64::new(
        raw.cache
            .listing_ttl_secs
            .unwrap_or(DEFAULT_CACHE_LISTING_TTL_SECS),
    )
    .ok_or_else(|| ConfigError::invalid("cache.listing_ttl_secs must be positive"))?;
    let detail_ttl = NonZeroU64::new(
        raw.cache
            .detail_ttl_secs
            .unwrap_or(DEFAULT_CACHE_DETAIL_TTL_SECS),
    )
    .ok_or_else(|| ConfigError::invalid("cache.detail_ttl_secs must be positive"))?;
    let pool_size = NonZeroU32::new(raw.cache.pool_size.unwrap_or(DEFAULT_CACHE_POOL_SIZE))
        .ok_or_else(|| ConfigError::invalid("cache.pool_size must be positive"))?;

    let level = match overrides.log_level.or(raw.logging.level) {
        Some(value) => LevelFilter::from_str(&value)
            .map_err(|_| ConfigError::invalid(format!("`{value}` is not a valid log level")))?,
        None => LevelFilter::INFO,
    };
    let format = match (overrides.log_json, raw.logging.format.as_deref()) {
        (Some(true), _) | (None, Some("json")) => LogFormat::Json,
        (Some(false), _) | (None, Some("compact") | None) => LogFormat::Compact,
        (None, Some(other)) => {
            return Err(ConfigError::invalid(format!(
                "`{other}` is not a valid log format (expected `compact` or `json`)"
            )));
        }
    };

    Ok(Settings {
        server: ServerSettings {
            addr: SocketAddr::new(ip, port),
        },
        database: DatabaseSettings {
            url: overrides.database_url.or(raw.database.url),
            max_connections,
        },
        cache: CacheSettings {
            enabled: overrides.cache_enabled.or(raw.cache.enabled).unwrap_or(true),
            url: overrides.cache_url.or(raw.cache.url),
            listing_ttl_secs: listing_ttl,
            detail_ttl_secs: detail_ttl,
            pool_size,
        },
        auth: AuthSettings {
            api_tokens: raw.auth.api_tokens.unwrap_or_default(),
        },
        logging: LoggingSettings { level, format },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_empty(overrides: Overrides) -> Settings {
        resolve(RawSettings::default(), overrides).expect("settings resolve")
    }

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let settings = resolve_empty(Overrides::default());
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.listing_ttl_secs.get(), 3600);
        assert_eq!(settings.cache.detail_ttl_secs.get(), 3600);
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert_eq!(settings.logging.format, LogFormat::Compact);
        assert!(settings.database.url.is_none());
        assert!(settings.auth.api_tokens.is_empty());
    }

    #[test]
    fn cli_overrides_win_over_file_values() {
        let raw = RawSettings {
            server: RawServer {
                host: Some("0.0.0.0".to_string()),
                port: Some(8080),
            },
            database: RawDatabase {
                url: Some("postgres://file/db".to_string()),
                max_connections: Some(4),
            },
            ..RawSettings::default()
        };
        let overrides = Overrides {
            server_port: Some(9090),
            database_url: Some("postgres://cli/db".to_string()),
            ..Overrides::default()
        };

        let settings = resolve(raw, overrides).unwrap();
        assert_eq!(settings.server.addr.port(), 9090);
        assert_eq!(settings.server.addr.ip().to_string(), "0.0.0.0");
        assert_eq!(settings.database.url.as_deref(), Some("postgres://cli/db"));
        assert_eq!(settings.database.max_connections.get(), 4);
    }

    #[test]
    fn rejects_invalid_values() {
        let raw = RawSettings {
            server: RawServer {
                host: Some("not a host".to_string()),
                port: None,
            },
            ..RawSettings::default()
        };
        assert!(resolve(raw, Overrides::default()).is_err());

        let raw = RawSettings {
            logging: RawLogging {
                level: Some("verbose".to_string()),
                format: None,
            },
            ..RawSettings::default()
        };
        assert!(resolve(raw, Overrides::default()).is_err());

        let raw = RawSettings {
            cache: RawCache {
                listing_ttl_secs: Some(0),
                ..RawCache::default()
            },
            ..RawSettings::default()
        };
        assert!(resolve(raw, Overrides::default()).is_err());
    }

    #[test]
    fn cache_settings_convert_to_cache_config() {
        let settings = resolve_empty(Overrides::default());
        let config = CacheConfig::from(&settings.cache);
        assert!(config.enabled);
        assert_eq!(config.listing_ttl, Duration::from_secs(3600));
        assert_eq!(config.detail_ttl, Duration::from_secs(3600));
    }
}
