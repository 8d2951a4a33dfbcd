use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ProbeError;

use super::Probe;

/// Only a green cluster counts as healthy; yellow means missing replicas
const HEALTHY_CLUSTER_STATUS: &str = "green";

#[derive(Debug, Deserialize)]
struct ClusterHealth {
    status: String,
}

pub struct ElasticsearchProbe {
    name: String,
    url: String,
    client: Client,
}

impl ElasticsearchProbe {
    pub fn new(name: String, url: String, client: Client) -> Self {
        Self {
            name,
            url: url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl Probe for ElasticsearchProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "elasticsearch"
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    #[instrument(name = "probe.elasticsearch", skip(self), fields(service = %self.name, url = %self.url))]
    async fn check(&self) -> Result<(), ProbeError> {
        let url = format!("{}/_cluster/health", self.url);
        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ProbeError::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        tracing::debug!("Checking cluster health");
        let body = response.bytes().await?;
        let health: ClusterHealth = serde_json::from_slice(&body)?;
        if health.status != HEALTHY_CLUSTER_STATUS {
            return Err(ProbeError::Unhealthy(format!(
                "cluster status is {}",
                health.status
            )));
        }
        Ok(())
    }
}
