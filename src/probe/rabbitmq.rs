use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::config::RabbitmqConfig;
use crate::error::ProbeError;

use super::Probe;

#[derive(Debug, Deserialize)]
struct Node {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NodeHealth {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Checks every cluster node through the management API.
pub struct RabbitmqProbe {
    config: RabbitmqConfig,
    client: Client,
}

impl RabbitmqProbe {
    pub fn new(mut config: RabbitmqConfig, client: Client) -> Self {
        config.url = config.url.trim_end_matches('/').to_string();
        Self { config, client }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ProbeError> {
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ProbeError::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Probe for RabbitmqProbe {
    fn name(&self) -> &str {
        "rabbitmq"
    }

    fn kind(&self) -> &'static str {
        "rabbitmq"
    }

    fn endpoint(&self) -> &str {
        &self.config.url
    }

    #[instrument(name = "probe.rabbitmq", skip(self), fields(url = %self.config.url))]
    async fn check(&self) -> Result<(), ProbeError> {
        let nodes: Vec<Node> = self
            .get_json(format!("{}/api/nodes", self.config.url))
            .await?;
        tracing::debug!(nodes = nodes.len(), "Obtained cluster info");

        // The first unhealthy node decides the verdict
        for node in nodes {
            tracing::debug!(node = %node.name, "Checking node health");
            let health: NodeHealth = self
                .get_json(format!(
                    "{}/api/healthchecks/node/{}",
                    self.config.url,
                    urlencoding::encode(&node.name)
                ))
                .await?;

            if health.status != "ok" {
                return Err(ProbeError::Unhealthy(format!(
                    "node {} reports {}{}",
                    node.name,
                    health.status,
                    health
                        .reason
                        .map(|r| format!(": {r}"))
                        .unwrap_or_default()
                )));
            }
        }

        Ok(())
    }
}
