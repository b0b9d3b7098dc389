/// Render targets, a stand-in for the dashboard's DOM.
///
/// A surface is a fixed set of named slots defined by the page layout.
/// Writes to a slot the layout does not carry report `false` so renderers
/// can tolerate partial layouts without treating them as errors.
pub trait Surface {
    fn set_content(&mut self, target: &str, html: String) -> bool;
    fn content(&self, target: &str) -> Option<&str>;
}

struct Slot {
    id: String,
    content: String,
}

/// In-memory page: slot contents in layout order, assembled into the
/// served HTML document on demand.
pub struct PageSurface {
    slots: Vec<Slot>,
}

/// Configuration status slots, in display order.
pub const CONFIG_SLOTS: [&str; 8] = [
    "chirpstack_server_status",
    "chirpstack_api_status",
    "influxdb_server_status",
    "influxdb_token_status",
    "influxdb_org_status",
    "influxdb_bucket_status",
    "rabbitmq_server_status",
    "telegram_conn_status",
];

/// Device metric chart slots, in display order.
pub const DEVICE_CHART_SLOTS: [&str; 6] =
    ["rxPackets", "rssi", "snr", "rxPacketsPerFreq", "rxPacketsPerDr", "errors"];

impl PageSurface {
    pub fn with_slots(ids: &[&str]) -> Self {
        Self {
            slots: ids
                .iter()
                .map(|id| Slot { id: id.to_string(), content: String::new() })
                .collect(),
        }
    }

    /// The full dashboard layout.
    pub fn dashboard() -> Self {
        let mut ids = vec!["last_refresh"];
        ids.extend(CONFIG_SLOTS);
        ids.extend([
            "devices_donut",
            "devices_total",
            "gateways_donut",
            "gateways_total",
            "gateway_alert_rows",
            "device_alert_rows",
            "device_detail_alerts",
        ]);
        ids.extend(DEVICE_CHART_SLOTS);
        Self::with_slots(&ids)
    }

    fn slot(&self, target: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == target)
    }

    /// Assemble the complete HTML document from the shell and slot contents.
    pub fn render_page(&self, title: &str) -> String {
        let mut body = String::new();
        for slot in &self.slots {
            body.push_str(&format!(
                "    <div class=\"slot\" id=\"{}\">{}</div>\n",
                slot.id, slot.content
            ));
        }
        format!(
            "{}<title>{}</title>\n{}\n{}{}",
            PAGE_HEAD, title, PAGE_BODY_OPEN, body, PAGE_FOOT
        )
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.slots
                .iter()
                .map(|s| (s.id.clone(), serde_json::Value::String(s.content.clone())))
                .collect(),
        )
    }
}

impl Surface for PageSurface {
    fn set_content(&mut self, target: &str, html: String) -> bool {
        match self.slots.iter_mut().find(|s| s.id == target) {
            Some(slot) => {
                slot.content = html;
                true
            }
            None => false,
        }
    }

    fn content(&self, target: &str) -> Option<&str> {
        self.slot(target).map(|s| s.content.as_str())
    }
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <style>
        body { background: #191c24; color: #e4e6ef; font-family: sans-serif; margin: 1rem; }
        .slot { margin-bottom: 0.75rem; }
        .row { display: flex; gap: 0.5rem; }
        .card { border-radius: 4px; padding: 0.75rem; background: #232837; cursor: pointer; }
        .card.critical { border-left: 4px solid #cc0000; }
        .card.warning { border-left: 4px solid #ff8c00; }
        .card.info { border-left: 4px solid #008000; }
        .text-success { color: #008000; }
        .text-danger { color: #cc0000; }
        .chart { min-height: 260px; }
    </style>
"#;

const PAGE_BODY_OPEN: &str = "</head>\n<body>";

const PAGE_FOOT: &str = r#"    <script>
        document.querySelectorAll('script[type="application/json"][data-chart]').forEach(node => {
            const spec = JSON.parse(node.textContent);
            Plotly.newPlot(node.dataset.chart, spec.traces, spec.layout, {displayModeBar: false});
        });
    </script>
</body>
</html>
"#;
