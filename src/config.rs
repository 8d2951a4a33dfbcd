//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file, applies environment
//! overrides for hosts and credentials, and defines the defaults used by the
//! poller, the probes and the HTTP listener. `AppConfig` is the root
//! configuration struct containing all settings.

use const_format::formatcp;
use http::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

// =============================================================================
// Polling Constants
// =============================================================================

/// Seconds between the end of one cycle and the start of the next
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Deadline for any single outbound call (HTTP request or client process)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Grace period for in-flight HTTP requests on shutdown
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

// =============================================================================
// HTTP Constants
// =============================================================================

/// Status returned by the snapshot route when any service is down.
/// Kept at 404 for compatibility with existing load balancer rules.
pub const DEFAULT_UNHEALTHY_STATUS: u16 = 404;

/// Snapshots are live data, never cache them
pub const CACHE_CONTROL_STATUS: &str = "no-store";

/// User agent sent to the cluster API and health endpoints
pub const USER_AGENT: &str = formatcp!(
    "{}/{}",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_VERSION")
);

// =============================================================================
// Probe Constants
// =============================================================================

/// Client binary for MySQL status checks
pub const MYSQL_ADMIN_PROGRAM: &str = "mysqladmin";

/// Client binary for Redis PING checks
pub const REDIS_CLI_PROGRAM: &str = "redis-cli";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "vigil=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    pub http: HttpServerConfig,
    /// Polling loop settings
    #[serde(default)]
    pub probe: ProbeSettings,
    /// Relational stores, checked with mysqladmin
    #[serde(default)]
    pub mysql: Vec<MysqlConfig>,
    pub redis: Option<RedisConfig>,
    pub rabbitmq: Option<RabbitmqConfig>,
    /// Search clusters, checked via /_cluster/health
    #[serde(default)]
    pub elasticsearch: Vec<ElasticsearchConfig>,
    /// Cluster whose workloads are rolled up into the snapshot
    pub kubernetes: Option<KubernetesConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Status code for the snapshot route when a service is down (default: 404)
    #[serde(default = "HttpServerConfig::default_unhealthy_status")]
    pub unhealthy_status: u16,
}

impl HttpServerConfig {
    fn default_unhealthy_status() -> u16 {
        DEFAULT_UNHEALTHY_STATUS
    }

    /// Apply a `--serve` style listen address. Accepts `host:port` or `:port`.
    pub fn apply_serve(&mut self, serve: &str) -> Result<(), ConfigError> {
        let (host, port) = serve
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::Validation(format!("Invalid listen address: {serve}")))?;
        self.port = port
            .parse()
            .map_err(|_| ConfigError::Validation(format!("Invalid listen port: {serve}")))?;
        if !host.is_empty() {
            self.host = host.to_string();
        }
        Ok(())
    }

    /// Parsed status code for unhealthy snapshots
    pub fn unhealthy_status_code(&self) -> Result<StatusCode, ConfigError> {
        StatusCode::from_u16(self.unhealthy_status)
            .ok()
            .filter(|code| code.is_client_error() || code.is_server_error())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "http.unhealthy_status must be a 4xx or 5xx code, got {}",
                    self.unhealthy_status
                ))
            })
    }
}

/// Polling loop settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeSettings {
    /// Sleep between cycles in seconds (default: 30)
    #[serde(default = "ProbeSettings::default_interval")]
    pub interval_seconds: u64,
    /// Per-call deadline in seconds (default: 10)
    #[serde(default = "ProbeSettings::default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            interval_seconds: Self::default_interval(),
            timeout_seconds: Self::default_timeout(),
        }
    }
}

impl ProbeSettings {
    fn default_interval() -> u64 {
        DEFAULT_POLL_INTERVAL_SECS
    }

    fn default_timeout() -> u64 {
        DEFAULT_PROBE_TIMEOUT_SECS
    }
}

/// A MySQL server checked with `mysqladmin status`
#[derive(Debug, Clone, Deserialize)]
pub struct MysqlConfig {
    /// Service name reported in the snapshot (e.g. "mysql-app")
    pub name: String,
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    #[serde(default = "RedisConfig::default_port")]
    pub port: u16,
    /// Passed as `-a` only when non-empty
    #[serde(default)]
    pub password: String,
}

impl RedisConfig {
    fn default_port() -> u16 {
        DEFAULT_REDIS_PORT
    }
}

/// RabbitMQ management API
#[derive(Debug, Clone, Deserialize)]
pub struct RabbitmqConfig {
    pub url: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElasticsearchConfig {
    /// Service name reported in the snapshot (e.g. "elasticsearch-logging")
    pub name: String,
    pub url: String,
}

/// Kubernetes API access for the workload roll-up
#[derive(Debug, Clone, Deserialize)]
pub struct KubernetesConfig {
    /// API server base URL, e.g. https://10.0.0.1:6443
    pub host: String,
    /// Service account bearer token
    #[serde(default)]
    pub token: String,
    /// Namespace whose pods are rolled up
    pub namespace: String,
    /// Extra CA bundle (PEM) for the API server certificate
    pub ca_cert_path: Option<String>,
    /// Skip certificate verification entirely (self-signed clusters)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

/// Environment variable prefix for a named service: "mysql-app" -> "MYSQL_APP"
pub fn env_prefix(name: &str) -> String {
    name.to_uppercase().replace(['-', '.'], "_")
}

fn override_from<F>(target: &mut String, lookup: &F, key: &str)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key) {
        *target = value;
    }
}

impl AppConfig {
    /// Read the file and apply environment overrides. Not validated yet:
    /// command-line overrides go on top first, then call [`Self::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Overwrite hosts and credentials from the environment so secrets can
    /// stay out of the config file. Only services already present in the
    /// file are touched.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for mysql in &mut self.mysql {
            let prefix = env_prefix(&mysql.name);
            override_from(&mut mysql.host, &lookup, &format!("{prefix}_HOST"));
            override_from(&mut mysql.user, &lookup, &format!("{prefix}_USER"));
            override_from(&mut mysql.password, &lookup, &format!("{prefix}_PASS"));
        }

        if let Some(redis) = &mut self.redis {
            override_from(&mut redis.host, &lookup, "REDIS_HOST");
            override_from(&mut redis.password, &lookup, "REDIS_PASS");
        }

        if let Some(rabbitmq) = &mut self.rabbitmq {
            override_from(&mut rabbitmq.url, &lookup, "RABBITMQ_URL");
            override_from(&mut rabbitmq.user, &lookup, "RABBITMQ_USER");
            override_from(&mut rabbitmq.password, &lookup, "RABBITMQ_PASS");
        }

        for es in &mut self.elasticsearch {
            let key = format!("{}_URL", env_prefix(&es.name));
            override_from(&mut es.url, &lookup, &key);
        }

        if let Some(kube) = &mut self.kubernetes {
            override_from(&mut kube.host, &lookup, "KUBERNETES_HOST");
            override_from(&mut kube.token, &lookup, "KUBERNETES_TOKEN");
            override_from(&mut kube.namespace, &lookup, "KUBERNETES_NAMESPACE");
        }
    }

    /// Apply `--serve` and `--interval`
    pub fn apply_cli(&mut self, serve: Option<&str>, interval: Option<u64>) -> Result<(), ConfigError> {
        if let Some(serve) = serve {
            self.http.apply_serve(serve)?;
        }
        if let Some(interval) = interval {
            self.probe.interval_seconds = interval;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "probe.interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.probe.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "probe.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        self.http.unhealthy_status_code()?;

        let mut seen = HashSet::new();
        for name in self.service_names() {
            if !seen.insert(name) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate service name: {name}"
                )));
            }
        }

        Ok(())
    }

    /// Names of all configured backing services, in probe order
    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mysql.iter().map(|m| m.name.as_str()).collect();
        if self.redis.is_some() {
            names.push("redis");
        }
        names.extend(self.elasticsearch.iter().map(|e| e.name.as_str()));
        if self.rabbitmq.is_some() {
            names.push("rabbitmq");
        }
        names
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
