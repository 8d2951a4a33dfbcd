//! Backing-service probes.
//!
//! Each probe makes one attempt per cycle and reports a binary verdict. A
//! failing probe only marks its own service down; it never aborts the cycle.
//!
//! - MySQL and Redis are checked by running their command-line clients
//! - Elasticsearch and RabbitMQ are checked over their HTTP health APIs

mod command;
mod elasticsearch;
mod mysql;
mod rabbitmq;
mod redis;

pub use elasticsearch::ElasticsearchProbe;
pub use mysql::MysqlProbe;
pub use rabbitmq::RabbitmqProbe;
pub use redis::RedisProbe;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::{AppConfig, USER_AGENT};
use crate::error::ProbeError;

/// Verdict for one backing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Down,
}

impl ServiceStatus {
    pub fn is_ok(self) -> bool {
        self == ServiceStatus::Ok
    }
}

/// A single liveness check against one backing service.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Service name reported in the snapshot
    fn name(&self) -> &str;

    /// Service kind for logging ("mysql", "redis", ...)
    fn kind(&self) -> &'static str;

    /// Where the probe points, for startup logs. Never includes credentials.
    fn endpoint(&self) -> &str;

    async fn check(&self) -> Result<(), ProbeError>;
}

/// Run a probe and fold the outcome into a status, logging failures.
pub async fn run_probe(probe: &dyn Probe) -> ServiceStatus {
    let start = Instant::now();
    let result = probe.check().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            tracing::debug!(
                service = %probe.name(),
                kind = probe.kind(),
                duration_ms,
                "Service healthy"
            );
            ServiceStatus::Ok
        }
        Err(e) => {
            tracing::warn!(
                service = %probe.name(),
                kind = probe.kind(),
                duration_ms,
                error = %e,
                "Service check failed"
            );
            ServiceStatus::Down
        }
    }
}

/// Shared HTTP client for the HTTP-based probes
pub fn http_client(timeout: Duration) -> Result<Client, ProbeError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Build every configured probe, in probe order.
pub fn probes_from_config(config: &AppConfig) -> Result<Vec<Box<dyn Probe>>, ProbeError> {
    let timeout = Duration::from_secs(config.probe.timeout_seconds);
    let client = http_client(timeout)?;
    let mut probes: Vec<Box<dyn Probe>> = Vec::new();

    for mysql in &config.mysql {
        probes.push(Box::new(MysqlProbe::new(mysql.clone(), timeout)));
    }

    if let Some(redis) = &config.redis {
        probes.push(Box::new(RedisProbe::new(redis.clone(), timeout)));
    }

    for es in &config.elasticsearch {
        probes.push(Box::new(ElasticsearchProbe::new(
            es.name.clone(),
            es.url.clone(),
            client.clone(),
        )));
    }

    if let Some(rabbitmq) = &config.rabbitmq {
        probes.push(Box::new(RabbitmqProbe::new(rabbitmq.clone(), client.clone())));
    }

    Ok(probes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Result<(), ()>);

    #[async_trait]
    impl Probe for FixedProbe {
        fn name(&self) -> &str {
            "fixed"
        }

        fn kind(&self) -> &'static str {
            "test"
        }

        fn endpoint(&self) -> &str {
            "memory"
        }

        async fn check(&self) -> Result<(), ProbeError> {
            self.0
                .map_err(|_| ProbeError::Unhealthy("fixed failure".to_string()))
        }
    }

    #[tokio::test]
    async fn test_run_probe_maps_result() {
        assert_eq!(run_probe(&FixedProbe(Ok(()))).await, ServiceStatus::Ok);
        assert_eq!(run_probe(&FixedProbe(Err(()))).await, ServiceStatus::Down);
    }

    #[test]
    fn test_service_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ServiceStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(serde_json::to_string(&ServiceStatus::Down).unwrap(), "\"down\"");
    }

    #[test]
    fn test_probes_follow_config_order() {
        let config = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 9000

            [[mysql]]
            name = "mysql-app"
            host = "db"
            user = "u"

            [redis]
            host = "redis"

            [rabbitmq]
            url = "http://mq:15672"
            user = "guest"

            [[elasticsearch]]
            name = "elasticsearch"
            url = "http://es:9200"
            "#,
        )
        .unwrap();

        let probes = probes_from_config(&config).unwrap();
        let names: Vec<&str> = probes.iter().map(|p| p.name()).collect();
        assert_eq!(names, config.service_names());
        let kinds: Vec<&str> = probes.iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec!["mysql", "redis", "elasticsearch", "rabbitmq"]);
    }
}
