use std::sync::Arc;

use health_dashboard::{AuthorizationState, DashboardService, Notice};
use health_platform::Metric;
use health_platform::http_client::ReqwestHealthPlatform;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer, remediation: bool) -> DashboardService {
    let platform = ReqwestHealthPlatform::new(&server.uri(), SecretString::new("tok".into()))
        .expect("client")
        .with_remediation(remediation);
    DashboardService::new(Arc::new(platform))
}

async fn mount_json(server: &MockServer, verb: &str, p: &str, body: serde_json::Value) {
    Mock::given(method(verb))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn prompt_then_load_over_bridge() {
    let server = MockServer::start().await;
    let available = json!({"available": true});
    mount_json(&server, "GET", "/api/v1/health/available", available).await;
    let check = json!({"authorized": false});
    mount_json(&server, "POST", "/api/v1/health/authorization/check", check).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/health/authorization/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"granted": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/health/aggregated"))
        .and(body_partial_json(json!({"dataType": "steps", "bucket": "day"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"startDate": "2025-03-04", "value": 1000},
            {"startDate": "2025-03-09", "value": 500}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/health/aggregated"))
        .and(body_partial_json(json!({"dataType": "heart_rate"})))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;
    // distance and calories
    Mock::given(method("POST"))
        .and(path("/api/v1/health/aggregated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"startDate": "2025-03-05", "value": 2}
        ])))
        .mount(&server)
        .await;

    let svc = service(&server, false);
    let outcome = svc.on_platform_ready().await;

    assert_eq!(outcome, AuthorizationState::Authorized);
    let st = svc.state();
    assert!(st.authorized);
    assert_eq!(st.snapshot(Metric::Steps).total, 1500.0);
    assert_eq!(st.snapshot(Metric::Distance).total, 2.0);
    assert!(st.snapshot(Metric::HeartRate).is_empty());
    assert_eq!(st.snapshot(Metric::Calories).total, 2.0);
}

#[tokio::test]
async fn bridge_failure_opens_store_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health/available"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Health Connect not installed"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/health/store/open"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, true);
    let mut notices = svc.notices();
    let outcome = svc.on_platform_ready().await;

    assert_eq!(outcome, AuthorizationState::Error);
    let st = svc.state();
    assert!(!st.authorized);
    assert!(
        st.error
            .as_deref()
            .unwrap_or_default()
            .starts_with("Error during health access:")
    );

    let mut seen = Vec::new();
    while let Ok(n) = notices.try_recv() {
        seen.push(n);
    }
    assert_eq!(seen.last(), Some(&Notice::RemediationOpened));

    let received = server.received_requests().await.unwrap();
    assert!(
        received
            .iter()
            .all(|r| r.url.path() != "/api/v1/health/aggregated")
    );
}

#[tokio::test]
async fn unavailable_bridge_never_checks_authorization() {
    let server = MockServer::start().await;
    let available = json!({"available": false});
    mount_json(&server, "GET", "/api/v1/health/available", available).await;

    let svc = service(&server, true);
    let outcome = svc.on_platform_ready().await;

    assert_eq!(outcome, AuthorizationState::Unavailable);
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.path(), "/api/v1/health/available");
}
