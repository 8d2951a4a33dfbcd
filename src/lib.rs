//! Vigil - health aggregation probe
//!
//! Periodically checks a fixed set of backing services (MySQL, Redis,
//! RabbitMQ, Elasticsearch) and rolls Kubernetes pod health up to the owning
//! workloads, then serves the combined snapshot as JSON over HTTP.

pub mod config;
pub mod error;
pub mod http;
pub mod kube;
pub mod middleware;
pub mod poller;
pub mod probe;
pub mod routes;
pub mod state;

pub use error::*;
