use crate::model::{ConfigReport, FleetStatus, StatusCheck, StatusCounts};
use crate::surface::Surface;
use tracing::{debug, warn};

/// Overwrite a status slot with a styled text span.
///
/// A missing target slot is a silent no-op so the same renderer works
/// against partial page layouts.
pub fn render_status(surface: &mut dyn Surface, target_id: &str, ok: bool, details: &str) {
    let class = if ok { "value text-success" } else { "value text-danger" };
    let html = format!("<span class=\"{}\">{}</span>", class, details);
    if !surface.set_content(target_id, html) {
        debug!("Status target {} not present in layout, skipping", target_id);
    }
}

fn render_check(surface: &mut dyn Surface, target_id: &str, check: &StatusCheck) {
    render_status(surface, target_id, check.ok, &check.details);
}

/// Map the four subsystem reports onto their status slots.
pub fn render_config_report(surface: &mut dyn Surface, report: &ConfigReport) {
    render_check(surface, "chirpstack_server_status", &report.chirpstack.server_health);
    render_check(surface, "chirpstack_api_status", &report.chirpstack.api_key_valid);

    render_check(surface, "influxdb_server_status", &report.influxdb.server_health);
    render_check(surface, "influxdb_token_status", &report.influxdb.auth_valid);
    render_check(surface, "influxdb_org_status", &report.influxdb.org_valid);
    render_check(surface, "influxdb_bucket_status", &report.influxdb.bucket_valid);

    render_check(surface, "rabbitmq_server_status", &report.rabbitmq.server_health);

    render_check(surface, "telegram_conn_status", &report.telegram);
}

fn check_counts(class: &str, counts: &StatusCounts) {
    if !counts.is_consistent() {
        warn!(
            "{} counts violate the total invariant: {}+{}+{} != {}",
            class, counts.offline, counts.online, counts.never_seen, counts.total
        );
    }
}

/// Write the displayed entity totals. The doughnut segments themselves are
/// the chart manager's job; this only covers the text counters.
pub fn render_fleet_totals(surface: &mut dyn Surface, fleet: &FleetStatus) {
    check_counts("Device", &fleet.devices);
    check_counts("Gateway", &fleet.gateways);
    surface.set_content("devices_total", fleet.devices.total.to_string());
    surface.set_content("gateways_total", fleet.gateways.total.to_string());
}

/// Plain-text configuration report for the `check` subcommand.
pub fn format_report(report: &ConfigReport) -> String {
    let mut out = String::new();
    out.push_str("Configuration Check\n");
    out.push_str("───────────────────────────────────────────\n");
    let line = |out: &mut String, label: &str, check: &StatusCheck| {
        let mark = if check.ok { "OK " } else { "FAIL" };
        out.push_str(&format!("  [{}] {:<24} {}\n", mark, label, check.details));
    };
    line(&mut out, "ChirpStack server", &report.chirpstack.server_health);
    line(&mut out, "ChirpStack API key", &report.chirpstack.api_key_valid);
    line(&mut out, "InfluxDB server", &report.influxdb.server_health);
    line(&mut out, "InfluxDB token", &report.influxdb.auth_valid);
    line(&mut out, "InfluxDB org", &report.influxdb.org_valid);
    line(&mut out, "InfluxDB bucket", &report.influxdb.bucket_valid);
    line(&mut out, "RabbitMQ server", &report.rabbitmq.server_health);
    line(&mut out, "Telegram bot", &report.telegram);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PageSurface;

    #[test]
    fn valid_status_renders_success_span() {
        let mut surface = PageSurface::with_slots(&["chirpstack_server_status"]);
        render_status(&mut surface, "chirpstack_server_status", true, "reachable");
        assert_eq!(
            surface.content("chirpstack_server_status"),
            Some(r#"<span class="value text-success">reachable</span>"#)
        );
    }

    #[test]
    fn invalid_status_renders_danger_span() {
        let mut surface = PageSurface::with_slots(&["telegram_conn_status"]);
        render_status(&mut surface, "telegram_conn_status", false, "token rejected");
        assert_eq!(
            surface.content("telegram_conn_status"),
            Some(r#"<span class="value text-danger">token rejected</span>"#)
        );
    }

    #[test]
    fn missing_target_is_a_noop() {
        let mut surface = PageSurface::with_slots(&["other"]);
        render_status(&mut surface, "chirpstack_server_status", true, "up");
        assert_eq!(surface.content("other"), Some(""));
    }

    #[test]
    fn fleet_totals_render_the_backend_total() {
        use crate::model::StatusCounts;
        let mut surface = PageSurface::with_slots(&["devices_total", "gateways_total"]);
        let fleet = FleetStatus {
            devices: StatusCounts { offline: 2, online: 5, never_seen: 1, total: 8 },
            gateways: StatusCounts { offline: 0, online: 3, never_seen: 0, total: 3 },
        };
        render_fleet_totals(&mut surface, &fleet);
        assert_eq!(surface.content("devices_total"), Some("8"));
        assert_eq!(surface.content("gateways_total"), Some("3"));
    }

    #[test]
    fn report_text_marks_failures() {
        let report: ConfigReport = serde_json::from_str(
            r#"[
                {"server_health": {"reachable": true, "details": "up"},
                 "api_key_valid": {"valid": false, "details": "expired"}},
                {"server_health": {"reachable": true, "details": "up"},
                 "auth_valid": {"valid": true, "details": "ok"},
                 "org_valid": {"valid": true, "details": "ok"},
                 "bucket_valid": {"valid": true, "details": "ok"}},
                {"server_health": {"reachable": true, "details": "up"}},
                {"validity": true, "details": "connected"}
            ]"#,
        )
        .unwrap();
        let text = format_report(&report);
        assert!(text.contains("[FAIL] ChirpStack API key"));
        assert!(text.contains("[OK ] Telegram bot"));
    }
}
