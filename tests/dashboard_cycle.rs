use axum::{routing::get, Json, Router};
use serde_json::json;

use lorawatch::fetch::DataFetcher;
use lorawatch::scheduler::RefreshScheduler;

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn healthy_backend() -> Router {
    Router::new()
        .route(
            "/config_check",
            get(|| async {
                Json(json!([
                    {"server_health": {"reachable": true, "details": "ChirpStack reachable"},
                     "api_key_valid": {"valid": true, "details": "API key accepted"}},
                    {"server_health": {"reachable": true, "details": "InfluxDB reachable"},
                     "auth_valid": {"valid": true, "details": "token accepted"},
                     "org_valid": {"valid": true, "details": "org found"},
                     "bucket_valid": {"valid": false, "details": "bucket missing"}},
                    {"server_health": {"reachable": true, "details": "RabbitMQ reachable"}},
                    {"validity": true, "details": "bot connected"}
                ]))
            }),
        )
        .route(
            "/status_data",
            get(|| async {
                Json(json!({
                    "devices": {"offline": 2, "online": 5, "never_seen": 1, "total": 8},
                    "gateways": {"offline": 0, "online": 3, "never_seen": 0, "total": 3}
                }))
            }),
        )
        .route(
            "/device_alerts",
            get(|| async {
                Json(json!([
                    ["sensor-12", "gw-3", "Battery low", "msg", "warning", "abc-123"]
                ]))
            }),
        )
        .route("/gateway_alerts", get(|| async { Json(json!([])) }))
        .route(
            "/device_metrics",
            get(|| async {
                Json(json!({
                    "rxPackets": {
                        "name": "Received Packets",
                        "timestamps": ["2024-12-11T10:00:00Z", "2024-12-11T11:00:00Z"],
                        "datasets": [{"label": "rx", "data": [4.0, 2.0]}]
                    },
                    "rxPacketsPerFreq": {
                        "name": "Packets per Frequency",
                        "timestamps": ["2024-12-11T10:00:00Z", "2024-12-11T11:00:00Z"],
                        "datasets": [
                            {"label": "868300000", "data": [1.0]},
                            {"label": "868100000", "data": [5.0, 6.0]}
                        ]
                    },
                    "rxPacketsPerDr": {
                        "name": "Packets per DR",
                        "timestamps": ["2024-12-11T10:00:00Z", "2024-12-11T11:00:00Z"],
                        "datasets": [
                            {"label": "0", "data": [1.0, 0.0]},
                            {"label": "5", "data": [0.0, 2.0]}
                        ]
                    }
                }))
            }),
        )
}

#[tokio::test]
async fn full_cycle_renders_every_section() {
    let base = spawn_backend(healthy_backend()).await;
    let fetcher = DataFetcher::new(&base).unwrap();
    let scheduler = RefreshScheduler::new(fetcher, Some("dev-1".to_string()));

    scheduler.run_once().await;
    let page = scheduler.page_json();

    // Config statuses styled by validity.
    assert_eq!(
        page["chirpstack_server_status"].as_str().unwrap(),
        r#"<span class="value text-success">ChirpStack reachable</span>"#
    );
    assert_eq!(
        page["influxdb_bucket_status"].as_str().unwrap(),
        r#"<span class="value text-danger">bucket missing</span>"#
    );

    // Fleet doughnuts and totals.
    assert!(page["devices_donut"].as_str().unwrap().contains("\"values\":[2,5,1]"));
    assert_eq!(page["devices_total"].as_str().unwrap(), "8");
    assert_eq!(page["gateways_total"].as_str().unwrap(), "3");

    // Device alert card deep links.
    let alerts = page["device_alert_rows"].as_str().unwrap();
    assert!(alerts.contains("/device?alert_uid=abc-123"));
    assert!(alerts.contains("/delete_alert?uid=abc-123"));
    assert!(alerts.contains("card warning"));

    // Zero gateway alerts is an explicit placeholder, not an empty div.
    assert_eq!(
        page["gateway_alert_rows"].as_str().unwrap(),
        "<p>No alerts available.</p>"
    );

    // Device metric charts: line, heatmap, stacked bar.
    assert!(page["rxPackets"].as_str().unwrap().contains("lines+markers"));
    assert!(page["rxPacketsPerFreq"].as_str().unwrap().contains("\"type\":\"heatmap\""));
    assert!(page["rxPacketsPerDr"].as_str().unwrap().contains("\"barmode\":\"stack\""));

    // Series the backend omitted degrade to named placeholders.
    assert!(page["rssi"].as_str().unwrap().contains("No data available"));
    assert!(page["errors"].as_str().unwrap().contains("No data available"));
}

#[tokio::test]
async fn refresh_cycles_do_not_stack_chart_instances() {
    let base = spawn_backend(healthy_backend()).await;
    let fetcher = DataFetcher::new(&base).unwrap();
    let scheduler = RefreshScheduler::new(fetcher, Some("dev-1".to_string()));

    scheduler.run_once().await;
    scheduler.run_once().await;
    let page = scheduler.page_json();

    let donut = page["devices_donut"].as_str().unwrap();
    assert_eq!(donut.matches("data-chart").count(), 1);
    let rx = page["rxPackets"].as_str().unwrap();
    assert_eq!(rx.matches("data-chart").count(), 1);
}

#[tokio::test]
async fn failing_backend_degrades_sections_independently() {
    // Only the status endpoint works; everything else is a 404.
    let app = Router::new().route(
        "/status_data",
        get(|| async {
            Json(json!({
                "devices": {"offline": 1, "online": 1, "never_seen": 0, "total": 2},
                "gateways": {"offline": 0, "online": 1, "never_seen": 0, "total": 1}
            }))
        }),
    );
    let base = spawn_backend(app).await;
    let fetcher = DataFetcher::new(&base).unwrap();
    let scheduler = RefreshScheduler::new(fetcher, None);

    scheduler.run_once().await;
    let page = scheduler.page_json();

    // The healthy section rendered.
    assert_eq!(page["devices_total"].as_str().unwrap(), "2");
    // Failed alert fetches render the same placeholder as "no alerts".
    assert_eq!(
        page["device_alert_rows"].as_str().unwrap(),
        "<p>No alerts available.</p>"
    );
    // Config statuses stay absent rather than styled.
    assert_eq!(page["chirpstack_server_status"].as_str().unwrap(), "");
}
