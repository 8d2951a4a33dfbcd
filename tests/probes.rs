//! HTTP-based service probes against mocked endpoints.

use std::time::Duration;

use serde_json::json;
use vigil::config::RabbitmqConfig;
use vigil::error::ProbeError;
use vigil::probe::{http_client, run_probe, ElasticsearchProbe, Probe, RabbitmqProbe, ServiceStatus};
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn es_probe(server: &MockServer) -> ElasticsearchProbe {
    ElasticsearchProbe::new(
        "elasticsearch".to_string(),
        format!("{}/", server.uri()),
        http_client(Duration::from_secs(5)).unwrap(),
    )
}

fn rabbit_probe(server: &MockServer) -> RabbitmqProbe {
    RabbitmqProbe::new(
        RabbitmqConfig {
            url: server.uri(),
            user: "guest".to_string(),
            password: "secret".to_string(),
        },
        http_client(Duration::from_secs(5)).unwrap(),
    )
}

async fn mount_es_health(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cluster_name": "search",
            "status": status,
            "number_of_nodes": 3
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_elasticsearch_green_is_healthy() {
    let server = MockServer::start().await;
    mount_es_health(&server, "green").await;
    let probe = es_probe(&server);
    assert!(probe.check().await.is_ok());
    assert_eq!(run_probe(&probe).await, ServiceStatus::Ok);
}

#[tokio::test]
async fn test_elasticsearch_yellow_is_unhealthy() {
    let server = MockServer::start().await;
    mount_es_health(&server, "yellow").await;
    let err = es_probe(&server).check().await.unwrap_err();
    assert!(matches!(err, ProbeError::Unhealthy(_)));
}

#[tokio::test]
async fn test_elasticsearch_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let err = es_probe(&server).check().await.unwrap_err();
    assert!(matches!(err, ProbeError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_elasticsearch_unreachable_is_down() {
    let server = MockServer::start().await;
    let probe = es_probe(&server);
    drop(server);
    assert_eq!(run_probe(&probe).await, ServiceStatus::Down);
}

#[tokio::test]
async fn test_rabbitmq_all_nodes_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .and(basic_auth("guest", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "rabbit@mq-0", "running": true},
            {"name": "rabbit@mq-1", "running": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/healthchecks/node/rabbit%40mq-0"))
        .and(basic_auth("guest", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/healthchecks/node/rabbit%40mq-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    rabbit_probe(&server).check().await.unwrap();
}

#[tokio::test]
async fn test_rabbitmq_failed_node_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "rabbit@mq-0"},
            {"name": "rabbit@mq-1"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/healthchecks/node/rabbit%40mq-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "reason": "memory alarm"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/healthchecks/node/rabbit%40mq-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = rabbit_probe(&server).check().await.unwrap_err();
    match err {
        ProbeError::Unhealthy(msg) => assert!(msg.contains("memory alarm"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rabbitmq_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = rabbit_probe(&server).check().await.unwrap_err();
    assert!(matches!(err, ProbeError::UnexpectedStatus { status: 401, .. }));
}
