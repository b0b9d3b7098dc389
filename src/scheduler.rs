use crate::alerts::{self, CardShape, DETAIL_CHUNK, SUMMARY_CHUNK};
use crate::charts::{ChartData, ChartKind, ChartManager, ChartTarget};
use crate::fetch::DataFetcher;
use crate::model::{ConfigReport, DeviceAlert, DeviceMetrics, FleetStatus, GatewayAlert};
use crate::status;
use crate::surface::{PageSurface, Surface};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};

/// Last applied cycle id per consumer section.
#[derive(Default)]
struct AppliedCycles {
    config: u64,
    fleet: u64,
    device_alerts: u64,
    gateway_alerts: u64,
    device_charts: u64,
}

// Newest-wins guard: a response from an older cycle than the last applied
// one is dropped, so overlapping refreshes cannot roll a section backwards.
fn stale(last: &mut u64, cycle: u64, section: &str) -> bool {
    if cycle < *last {
        debug!(
            "Discarding stale {} response from cycle {} (last applied {})",
            section, cycle, last
        );
        return true;
    }
    *last = cycle;
    false
}

/// The mutable view: page surface, chart registry, and per-section
/// newest-wins bookkeeping. Touched only under the scheduler's lock.
pub struct ViewState {
    surface: PageSurface,
    charts: ChartManager,
    applied: AppliedCycles,
}

impl ViewState {
    fn new() -> Self {
        Self {
            surface: PageSurface::dashboard(),
            charts: ChartManager::new(),
            applied: AppliedCycles::default(),
        }
    }

    fn stamp(&mut self) {
        let now = chrono::Local::now();
        self.surface
            .set_content("last_refresh", now.format("%d %b %Y, %I:%M%p").to_string());
    }

    fn apply_config(&mut self, cycle: u64, report: ConfigReport) {
        if stale(&mut self.applied.config, cycle, "config") {
            return;
        }
        status::render_config_report(&mut self.surface, &report);
    }

    fn apply_fleet(&mut self, cycle: u64, fleet: FleetStatus) {
        if stale(&mut self.applied.fleet, cycle, "fleet status") {
            return;
        }
        status::render_fleet_totals(&mut self.surface, &fleet);
        let donuts = [
            ("devices_donut", fleet.devices),
            ("gateways_donut", fleet.gateways),
        ];
        for (id, counts) in donuts {
            let target = ChartTarget {
                id: id.to_string(),
                kind: ChartKind::Doughnut,
                data: ChartData::Counts(counts),
            };
            self.charts.replace_chart(&mut self.surface, &target);
        }
    }

    fn apply_device_alerts(&mut self, cycle: u64, records: Vec<DeviceAlert>) {
        if stale(&mut self.applied.device_alerts, cycle, "device alerts") {
            return;
        }
        let summary = alerts::build_row_groups(&records, SUMMARY_CHUNK);
        alerts::render_alert_rows(&mut self.surface, "device_alert_rows", &summary, CardShape::Summary);
        let detail = alerts::build_row_groups(&records, DETAIL_CHUNK);
        alerts::render_alert_rows(&mut self.surface, "device_detail_alerts", &detail, CardShape::Detail);
    }

    fn apply_gateway_alerts(&mut self, cycle: u64, records: Vec<GatewayAlert>) {
        if stale(&mut self.applied.gateway_alerts, cycle, "gateway alerts") {
            return;
        }
        let plan = alerts::build_row_groups(&records, SUMMARY_CHUNK);
        alerts::render_alert_rows(&mut self.surface, "gateway_alert_rows", &plan, CardShape::Summary);
    }

    fn apply_device_charts(&mut self, cycle: u64, metrics: DeviceMetrics) {
        if stale(&mut self.applied.device_charts, cycle, "device metrics") {
            return;
        }
        self.charts.replace_device_charts(&mut self.surface, metrics);
    }
}

/// Drives the fetch-and-render pass: an immediate cycle on `start`, then
/// one per interval tick, plus on-demand cycles via `run_once`. Cycles may
/// overlap; the per-section cycle ids keep application newest-wins.
pub struct RefreshScheduler {
    fetcher: DataFetcher,
    state: Mutex<ViewState>,
    cycle: AtomicU64,
    watch_device: Option<String>,
}

impl RefreshScheduler {
    pub fn new(fetcher: DataFetcher, watch_device: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            state: Mutex::new(ViewState::new()),
            cycle: AtomicU64::new(0),
            watch_device,
        })
    }

    /// One full fetch-and-render pass. The per-source fetches run
    /// concurrently and each section is applied as its own fetch resolves;
    /// a slow endpoint delays only its own section.
    pub async fn run_once(&self) {
        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Refresh cycle {} started", cycle);
        self.state.lock().unwrap().stamp();

        tokio::join!(
            async {
                if let Some(report) = self.fetcher.fetch_json::<ConfigReport>("/config_check").await {
                    self.state.lock().unwrap().apply_config(cycle, report);
                }
            },
            async {
                if let Some(fleet) = self.fetcher.fetch_json::<FleetStatus>("/status_data").await {
                    self.state.lock().unwrap().apply_fleet(cycle, fleet);
                }
            },
            async {
                // Fetch failure and "no alerts" are deliberately rendered
                // the same way; the log line is the distinguishing record.
                let records = self
                    .fetcher
                    .fetch_json::<Vec<DeviceAlert>>("/device_alerts")
                    .await
                    .unwrap_or_default();
                self.state.lock().unwrap().apply_device_alerts(cycle, records);
            },
            async {
                let records = self
                    .fetcher
                    .fetch_json::<Vec<GatewayAlert>>("/gateway_alerts")
                    .await
                    .unwrap_or_default();
                self.state.lock().unwrap().apply_gateway_alerts(cycle, records);
            },
            async {
                if let Some(uid) = &self.watch_device {
                    let path = format!("/device_metrics?uid={}", uid);
                    if let Some(metrics) = self.fetcher.fetch_json::<DeviceMetrics>(&path).await {
                        self.state.lock().unwrap().apply_device_charts(cycle, metrics);
                    }
                }
            },
        );
        debug!("Refresh cycle {} finished", cycle);
    }

    /// Immediate cycle, then one per tick. Cycles are fired without
    /// awaiting the previous one.
    pub async fn start(self: Arc<Self>, interval: Duration) {
        info!("Starting dashboard refresh with {:?} interval", interval);
        let mut ticker = time::interval(interval);
        loop {
            ticker.tick().await;
            let scheduler = self.clone();
            tokio::spawn(async move {
                scheduler.run_once().await;
            });
        }
    }

    /// The assembled dashboard document.
    pub fn render_page(&self) -> String {
        self.state.lock().unwrap().surface.render_page("Fleet Dashboard")
    }

    /// Slot contents keyed by slot id.
    pub fn page_json(&self) -> serde_json::Value {
        self.state.lock().unwrap().surface.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, StatusCounts};

    fn alert(uid: &str) -> DeviceAlert {
        DeviceAlert {
            device: "sensor-1".into(),
            gateway: "gw-1".into(),
            issue: "Device Reset".into(),
            message: "Frame Count is reset to 0".into(),
            severity: Severity::Critical,
            uid: uid.into(),
        }
    }

    #[test]
    fn stale_alert_response_is_discarded() {
        let mut state = ViewState::new();
        state.apply_device_alerts(2, vec![alert("fresh")]);
        state.apply_device_alerts(1, vec![alert("stale")]);
        let html = state.surface.content("device_alert_rows").unwrap();
        assert!(html.contains("fresh"));
        assert!(!html.contains("stale"));
    }

    #[test]
    fn equal_cycle_reapplies() {
        let mut state = ViewState::new();
        state.apply_device_alerts(3, vec![alert("first")]);
        state.apply_device_alerts(3, vec![alert("second")]);
        let html = state.surface.content("device_alert_rows").unwrap();
        assert!(html.contains("second"));
    }

    #[test]
    fn sections_track_staleness_independently() {
        let mut state = ViewState::new();
        state.apply_device_alerts(5, vec![alert("dev")]);
        // Cycle 2 is the newest the gateway section has seen, so it lands
        // even though the device section is already at cycle 5.
        state.apply_gateway_alerts(2, vec![]);
        assert_eq!(
            state.surface.content("gateway_alert_rows"),
            Some("<p>No alerts available.</p>")
        );
    }

    #[test]
    fn fleet_apply_feeds_the_doughnuts_and_totals() {
        let mut state = ViewState::new();
        let fleet = FleetStatus {
            devices: StatusCounts { offline: 2, online: 5, never_seen: 1, total: 8 },
            gateways: StatusCounts { offline: 0, online: 3, never_seen: 0, total: 3 },
        };
        state.apply_fleet(1, fleet);
        assert_eq!(state.surface.content("devices_total"), Some("8"));
        let donut = state.surface.content("devices_donut").unwrap();
        assert!(donut.contains("\"values\":[2,5,1]"));
        assert!(state.charts.is_registered("devices_donut"));
        assert!(state.charts.is_registered("gateways_donut"));
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_placeholders() {
        let fetcher = DataFetcher::new("http://127.0.0.1:9").unwrap();
        let scheduler = RefreshScheduler::new(fetcher, None);
        scheduler.run_once().await;
        let page = scheduler.page_json();
        assert_eq!(page["device_alert_rows"], "<p>No alerts available.</p>");
        assert_eq!(page["gateway_alert_rows"], "<p>No alerts available.</p>");
        // Config statuses stay unrendered rather than styled.
        assert_eq!(page["chirpstack_server_status"], "");
    }
}
