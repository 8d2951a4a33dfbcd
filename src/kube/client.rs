//! Kubernetes API client for the workload roll-up.
//!
//! Talks to the API server with a bearer token, scoped to a single namespace.
//! Responses are decoded into the typed records in [`super::api`] before
//! anything else looks at them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Certificate, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::{KubernetesConfig, USER_AGENT};
use crate::error::TopologyError;

use super::api::{ObjectList, ObjectMeta, OwnedObject, Pod};
use super::resolver::OwnerLookup;
use super::{build, evaluate, ClusterTopology, PodObservation, TopologySource};

/// Cluster API client for one namespace
#[derive(Clone)]
pub struct ClusterClient {
    http: Client,
    /// API server base URL without trailing slash
    host: String,
    token: String,
    namespace: String,
}

impl ClusterClient {
    pub fn new(config: &KubernetesConfig, timeout: Duration) -> Result<Self, TopologyError> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path)
                .map_err(|e| TopologyError::Setup(format!("Failed to read {path}: {e}")))?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| TopologyError::Setup(format!("Invalid CA certificate {path}: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| TopologyError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            host: config.host.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            namespace: config.namespace.clone(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// GET a list endpoint and decode its items
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        field_selector: Option<&str>,
    ) -> Result<Vec<T>, TopologyError> {
        let url = format!("{}{}", self.host, path);
        let mut request = self.http.get(&url).bearer_auth(&self.token);
        if let Some(selector) = field_selector {
            request = request.query(&[("fieldSelector", selector)]);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(TopologyError::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        let list: ObjectList<T> = serde_json::from_slice(&body)?;
        Ok(list.items)
    }

    /// Look up a namespaced object by exact name
    async fn find_by_name(
        &self,
        api_prefix: &str,
        resource: &str,
        name: &str,
    ) -> Result<Option<ObjectMeta>, TopologyError> {
        let path = format!(
            "{}/namespaces/{}/{}",
            api_prefix, self.namespace, resource
        );
        let selector = format!("metadata.name={name}");
        let items: Vec<OwnedObject> = self.get_list(&path, Some(&selector)).await?;
        Ok(items.into_iter().next().map(|o| o.metadata))
    }

    /// Fetch all pods in the namespace as observations.
    ///
    /// Pods without an owner reference are skipped.
    #[instrument(name = "kube.client.list_pods", skip(self), fields(namespace = %self.namespace))]
    pub async fn list_pods(&self) -> Result<Vec<PodObservation>, TopologyError> {
        let path = format!("/api/v1/namespaces/{}/pods", self.namespace);
        let pods: Vec<Pod> = self.get_list(&path, None).await?;

        let mut observations = Vec::with_capacity(pods.len());
        for pod in pods {
            if let Some(obs) = pod.into_observation()? {
                observations.push(obs);
            }
        }
        Ok(observations)
    }
}

#[async_trait]
impl OwnerLookup for ClusterClient {
    async fn replica_set(&self, name: &str) -> Result<Option<ObjectMeta>, TopologyError> {
        self.find_by_name("/apis/apps/v1", "replicasets", name).await
    }

    async fn job(&self, name: &str) -> Result<Option<ObjectMeta>, TopologyError> {
        self.find_by_name("/apis/batch/v1", "jobs", name).await
    }
}

#[async_trait]
impl TopologySource for ClusterClient {
    #[instrument(name = "kube.client.fetch_topology", skip(self), fields(host = %self.host))]
    async fn fetch_topology(&self) -> Result<ClusterTopology, TopologyError> {
        tracing::info!(namespace = %self.namespace, "Checking kubernetes cluster");
        let observations = self.list_pods().await?;
        let mut topology = build(self, &observations).await?;
        evaluate(&mut topology);
        tracing::debug!(
            groups = topology.group_count(),
            pods = topology.pod_count(),
            failed = topology.failed_groups(),
            "Cluster topology rebuilt"
        );
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> KubernetesConfig {
        KubernetesConfig {
            host: host.to_string(),
            token: "t".to_string(),
            namespace: "production".to_string(),
            ca_cert_path: None,
            accept_invalid_certs: true,
        }
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ClusterClient::new(&config("https://k8s:6443/"), Duration::from_secs(1)).unwrap();
        assert_eq!(client.host(), "https://k8s:6443");
        assert_eq!(client.namespace(), "production");
    }

    #[test]
    fn test_missing_ca_file_is_setup_error() {
        let mut cfg = config("https://k8s:6443");
        cfg.ca_cert_path = Some("/nonexistent/ca.crt".to_string());
        let err = ClusterClient::new(&cfg, Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, TopologyError::Setup(_)));
    }
}
