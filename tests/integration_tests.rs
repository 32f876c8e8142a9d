// Integration tests: login + fetch/aggregate against a mock Proxmox API
// served by axum on an ephemeral port.

use axum::extract::{Form, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pvetop::fetcher::{self, AnomalyMap};
use pvetop::models::{Aggregation, Anomaly, Metric, Timeframe, VmUsage};
use pvetop::proxmox_repo::{ProxmoxError, ProxmoxRepo};
use pvetop::report::{Stat, rank};
use serde_json::{Value, json};
use std::collections::HashMap;

const PASSWORD: &str = "hunter2";

async fn ticket(Form(params): Form<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("password").map(String::as_str) == Some(PASSWORD) {
        Json(json!({"data": {"ticket": "PVE:test:ticket", "CSRFPreventionToken": "tok"}}))
            .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "authentication failure").into_response()
    }
}

fn resources() -> Value {
    json!({"data": [
        {"vmid": 100, "name": "web-01", "node": "pve1", "status": "running", "type": "qemu"},
        {"vmid": 101, "name": "web-02", "node": "pve1", "status": "running", "type": "qemu"},
        {"vmid": 102, "name": "db-01", "node": "pve2", "status": "running", "type": "qemu"},
        {"vmid": 103, "name": "backup", "node": "pve2", "status": "stopped", "type": "qemu"},
    ]})
}

async fn rrddata(Path((_node, vmid)): Path<(String, u32)>) -> Json<Value> {
    let rows = match vmid {
        // avg cpu 0.10
        100 => json!([
            {"time": 1000, "cpu": 0.10, "netin": 100.0, "netout": 10.0, "diskread": 1.0, "diskwrite": 1.0},
            {"time": 1060, "cpu": 0.10, "netin": 100.0, "netout": 10.0, "diskread": 1.0, "diskwrite": 1.0},
        ]),
        // avg cpu 0.50; netin carries one out-of-range glitch
        101 => json!([
            {"time": 1000, "cpu": 0.40, "netin": 1000.0},
            {"time": 1060, "cpu": 0.50, "netin": 5000000000.0},
            {"time": 1120, "cpu": 0.60, "netin": 3000.0},
        ]),
        // avg cpu 0.25
        102 => json!([
            {"time": 1000, "cpu": 0.20, "netin": 200.0},
            {"time": 1060, "cpu": 0.30, "netin": 400.0},
        ]),
        // a single row: unreliable series
        104 => json!([
            {"time": 1000, "cpu": 0.90, "netin": 100.0},
        ]),
        _ => json!([]),
    };
    Json(json!({"data": rows}))
}

async fn spawn_mock(resource_payload: Value) -> String {
    let app = Router::new()
        .route("/api2/json/access/ticket", post(ticket))
        .route(
            "/api2/json/cluster/resources",
            get(move || {
                let payload = resource_payload.clone();
                async move { Json(payload) }
            }),
        )
        .route("/api2/json/nodes/{node}/qemu/{vmid}/rrddata", get(rrddata));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api2/json")
}

async fn login(base_url: &str) -> ProxmoxRepo {
    ProxmoxRepo::login_with_base_url(base_url, "monitor@pve", PASSWORD)
        .await
        .unwrap()
}

async fn fetch_all(repo: &ProxmoxRepo) -> (Vec<VmUsage>, AnomalyMap) {
    fetcher::fetch_usage(repo, Timeframe::Hour, Aggregation::Average, &[], false)
        .await
        .unwrap()
}

#[tokio::test]
async fn bad_password_is_an_auth_error() {
    let base = spawn_mock(resources()).await;
    let err = ProxmoxRepo::login_with_base_url(&base, "monitor@pve", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ProxmoxError::AuthFailed { .. }));
}

#[tokio::test]
async fn stopped_vms_are_skipped() {
    let base = spawn_mock(resources()).await;
    let repo = login(&base).await;
    let (usage, _) = fetch_all(&repo).await;
    let names: Vec<&str> = usage.iter().map(|u| u.vm.name.as_str()).collect();
    assert_eq!(names, ["web-01", "web-02", "db-01"]);
}

#[tokio::test]
async fn ranking_by_cpu_average_orders_and_truncates() {
    let base = spawn_mock(resources()).await;
    let repo = login(&base).await;
    let (usage, _) = fetch_all(&repo).await;
    let top2: Vec<&str> = rank(&usage, Metric::Cpu, Stat::Avg, 2)
        .iter()
        .map(|u| u.vm.name.as_str())
        .collect();
    assert_eq!(top2, ["web-02", "db-01"]);
}

#[tokio::test]
async fn out_of_range_netin_is_filtered_and_reported() {
    let base = spawn_mock(resources()).await;
    let repo = login(&base).await;
    let (usage, anomalies) = fetch_all(&repo).await;

    let web02 = usage.iter().find(|u| u.vm.name == "web-02").unwrap();
    let netin = web02.summary.get(Metric::NetIn);
    assert_eq!(netin.max, 3000.0);
    assert_eq!(netin.avg, 2000.0);

    assert_eq!(
        anomalies.get("web-02"),
        Some(&vec![Anomaly::OutOfRange {
            metric: Metric::NetIn,
            value: 5_000_000_000.0
        }])
    );
    assert!(!anomalies.contains_key("web-01"));
}

#[tokio::test]
async fn partial_match_selects_substring_names() {
    let base = spawn_mock(resources()).await;
    let repo = login(&base).await;
    let (usage, _) = fetcher::fetch_usage(
        &repo,
        Timeframe::Hour,
        Aggregation::Average,
        &["web".to_string()],
        true,
    )
    .await
    .unwrap();
    let names: Vec<&str> = usage.iter().map(|u| u.vm.name.as_str()).collect();
    assert_eq!(names, ["web-01", "web-02"]);
}

#[tokio::test]
async fn exact_match_requires_full_name() {
    let base = spawn_mock(resources()).await;
    let repo = login(&base).await;
    let (usage, _) = fetcher::fetch_usage(
        &repo,
        Timeframe::Hour,
        Aggregation::Average,
        &["web".to_string()],
        false,
    )
    .await
    .unwrap();
    assert!(usage.is_empty());
}

#[tokio::test]
async fn unexpected_status_aborts_the_run() {
    let payload = json!({"data": [
        {"vmid": 100, "name": "web-01", "node": "pve1", "status": "paused", "type": "qemu"},
    ]});
    let base = spawn_mock(payload).await;
    let repo = login(&base).await;
    let err = fetch_all_err(&repo).await;
    assert!(err.to_string().contains("paused"));
}

#[tokio::test]
async fn single_row_series_gets_sentinel_and_anomaly() {
    let payload = json!({"data": [
        {"vmid": 104, "name": "sparse", "node": "pve1", "status": "running", "type": "qemu"},
    ]});
    let base = spawn_mock(payload).await;
    let repo = login(&base).await;
    let (usage, anomalies) = fetch_all(&repo).await;
    let sparse = &usage[0];
    for metric in Metric::ALL {
        let s = sparse.summary.get(metric);
        assert_eq!((s.max, s.avg), (-1.0, -1.0));
    }
    assert_eq!(anomalies.get("sparse"), Some(&vec![Anomaly::SingleRow]));
}

async fn fetch_all_err(repo: &ProxmoxRepo) -> anyhow::Error {
    fetcher::fetch_usage(repo, Timeframe::Hour, Aggregation::Average, &[], false)
        .await
        .unwrap_err()
}
