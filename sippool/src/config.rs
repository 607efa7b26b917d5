//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `SIPPOOL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SIPPOOL_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `SIPPOOL_DATABASE__URL=...` sets the `database.url` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding
//! - **Database**: `database.url`, `database.pool.*` - PostgreSQL connection settings
//! - **Assignment**: `assignment.max_retries` - bound on the assign retry loop
//! - **Watcher**: `watcher.*` - background pool-utilization watcher
//! - **Provisioning**: `provision` - SIP accounts seeded idempotently at startup
//! - **CORS**: `cors.allowed_origins` - browser origins allowed to call the API
//! - **Telemetry**: `enable_otel_export` - OTLP trace export toggle

use crate::api::models::sip_configs::SipTransport;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SIPPOOL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Assignment service tuning
    pub assignment: AssignmentConfig,
    /// Background pool-utilization watcher
    pub watcher: WatcherConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
    /// SIP accounts to seed into the pool on startup (idempotent)
    pub provision: Vec<ProvisionedLine>,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8088,
            database: DatabaseConfig::default(),
            assignment: AssignmentConfig::default(),
            watcher: WatcherConfig::default(),
            cors: CorsConfig::default(),
            provision: Vec::new(),
            enable_otel_export: false,
        }
    }
}

/// PostgreSQL connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL; `DATABASE_URL` overrides this when set
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/sippool".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Individual pool configuration with all SQLx parameters.
///
/// These settings control connection pool behavior for optimal performance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    /// Production defaults: balanced for reliability and resource usage
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

impl PoolSettings {
    /// Build SQLx pool options from these settings
    pub fn pool_options(&self) -> sqlx::postgres::PgPoolOptions {
        let mut options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs));
        if self.idle_timeout_secs > 0 {
            options = options.idle_timeout(Duration::from_secs(self.idle_timeout_secs));
        }
        if self.max_lifetime_secs > 0 {
            options = options.max_lifetime(Duration::from_secs(self.max_lifetime_secs));
        }
        options
    }
}

/// Assignment service tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignmentConfig {
    /// Upper bound on candidates tried per assign request before giving up
    /// with `POOL_EXHAUSTED`. The effective bound is
    /// `min(max_retries, currently available)`.
    pub max_retries: i64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self { max_retries: 10 }
    }
}

/// Background pool-utilization watcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Whether the watcher runs at all
    pub enabled: bool,
    /// Sampling interval (humantime format, e.g. "60s", "5m")
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Log a warning once `percentage_used` reaches this value
    pub warn_threshold_pct: i64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            warn_threshold_pct: 90,
        }
    }
}

/// CORS configuration for browser clients
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; "*" allows any origin. Empty disables cross-origin access.
    pub allowed_origins: Vec<String>,
    /// Whether to allow credentials on cross-origin requests
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds
    pub max_age: Option<u64>,
}

/// A SIP account seeded into the pool at startup.
///
/// Seeding is idempotent on (username, domain): accounts already present are
/// left untouched, so manual changes survive restarts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionedLine {
    pub username: String,
    pub password: String,
    pub domain: String,
    pub server: String,
    #[serde(default = "default_sip_port")]
    pub port: i32,
    #[serde(default)]
    pub transport: SipTransport,
}

fn default_sip_port() -> i32 {
    5060
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(args: &Args) -> anyhow::Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("SIPPOOL_").split("__"))
            .extract()?;

        // DATABASE_URL is the conventional deployment override
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be non-zero");
        }
        if self.assignment.max_retries < 1 {
            anyhow::bail!("assignment.max_retries must be at least 1");
        }
        if !(0..=100).contains(&self.watcher.warn_threshold_pct) {
            anyhow::bail!("watcher.warn_threshold_pct must be between 0 and 100");
        }
        if self.watcher.enabled && self.watcher.interval.is_zero() {
            anyhow::bail!("watcher.interval must be non-zero");
        }
        let wildcard = self.cors.allowed_origins.iter().any(|origin| origin == "*");
        if wildcard && self.cors.allow_credentials {
            anyhow::bail!("cors.allow_credentials cannot be combined with a wildcard origin");
        }
        for origin in &self.cors.allowed_origins {
            if origin != "*" {
                Url::parse(origin).map_err(|e| anyhow::anyhow!("invalid CORS origin {origin:?}: {e}"))?;
            }
        }
        let mut seen = std::collections::HashSet::new();
        for line in &self.provision {
            if line.username.trim().is_empty() || line.domain.trim().is_empty() || line.server.trim().is_empty() {
                anyhow::bail!("provisioned lines require username, domain and server");
            }
            if !(1..=65535).contains(&line.port) {
                anyhow::bail!("provisioned line {}@{} has invalid port {}", line.username, line.domain, line.port);
            }
            if !seen.insert((line.username.as_str(), line.domain.as_str())) {
                anyhow::bail!("duplicate provisioned line {}@{}", line.username, line.domain);
            }
        }
        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
