use crate::model::{DeviceMetrics, MetricSeries, StatusCounts};
use crate::surface::{PageSurface, Surface};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Chart shape selected by data semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Timeseries,
    Heatmap,
    StackedBar,
    Doughnut,
}

/// Payload behind a chart slot.
#[derive(Debug, Clone)]
pub enum ChartData {
    Series(MetricSeries),
    Counts(StatusCounts),
}

/// A named chart slot plus its data and desired visual kind.
#[derive(Debug, Clone)]
pub struct ChartTarget {
    pub id: String,
    pub kind: ChartKind,
    pub data: ChartData,
}

/// Declarative chart description handed to the rendering capability.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub traces: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter {
        x: Vec<DateTime<Utc>>,
        y: Vec<f64>,
        mode: String,
        name: String,
    },
    Bar {
        x: Vec<DateTime<Utc>>,
        y: Vec<f64>,
        name: String,
        marker: Marker,
    },
    Heatmap {
        x: Vec<DateTime<Utc>>,
        y: Vec<i64>,
        z: Vec<Vec<f64>>,
        colorscale: String,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<u64>,
        hole: f64,
        marker: Marker,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
}

/// Doughnut palette: offline, online, never seen.
const DOUGHNUT_COLORS: [&str; 3] = ["#cc0000", "#008000", "#ff8c00"];
const DOUGHNUT_LABELS: [&str; 3] = ["Offline", "Online", "Never Seen"];

/// Deterministic per-label shade assignment, scoped to one manager's
/// lifetime so the same label keeps its color across refresh cycles.
pub struct ColorAssigner {
    assigned: HashMap<String, String>,
}

impl ColorAssigner {
    fn new() -> Self {
        Self { assigned: HashMap::new() }
    }

    pub fn color_for(&mut self, label: &str) -> String {
        if let Some(color) = self.assigned.get(label) {
            return color.clone();
        }
        let color = blue_shade(numeric_label(label).unwrap_or(0));
        self.assigned.insert(label.to_string(), color.clone());
        color
    }
}

/// Monotonic intensity mapping: 0 is the neutral/white sentinel, higher
/// values darken. Scaled for the DR label range of roughly 0-5.
fn blue_shade(value: i64) -> String {
    let intensity = value.saturating_mul(25).clamp(0, 255);
    if intensity == 0 {
        "rgb(255, 255, 255)".to_string()
    } else {
        format!("rgb(0, 0, {})", intensity)
    }
}

fn numeric_label(label: &str) -> Option<i64> {
    label.trim().parse::<i64>().ok()
}

/// Opaque live-chart token. Interpretation of the fields belongs to the
/// backend that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    pub target: String,
    pub serial: u64,
}

/// Rendering capability: "draw chart of this spec into target S".
pub trait ChartBackend {
    fn draw(&mut self, target: &str, spec: &ChartSpec) -> anyhow::Result<ChartHandle>;
    fn placeholder(&mut self, target: &str, message: &str);
    fn destroy(&mut self, handle: ChartHandle);
}

impl ChartBackend for PageSurface {
    fn draw(&mut self, target: &str, spec: &ChartSpec) -> anyhow::Result<ChartHandle> {
        let json = serde_json::to_string(spec)?;
        let html = format!(
            concat!(
                "<div class=\"chart\" id=\"{target}-plot\"></div>",
                "<script type=\"application/json\" data-chart=\"{target}-plot\">{json}</script>"
            ),
            target = target,
            json = json,
        );
        self.set_content(target, html);
        Ok(ChartHandle { target: target.to_string(), serial: 0 })
    }

    fn placeholder(&mut self, target: &str, message: &str) {
        self.set_content(target, format!("<div class=\"no-data\">{}</div>", message));
    }

    fn destroy(&mut self, handle: ChartHandle) {
        self.set_content(&handle.target, String::new());
    }
}

/// Owns the live-chart registry and the session color cache. Exactly one
/// live handle exists per target id at any time; the destroy-before-create
/// ordering inside `replace_chart` is what guarantees it.
pub struct ChartManager {
    registry: HashMap<String, ChartHandle>,
    colors: ColorAssigner,
}

impl ChartManager {
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
            colors: ColorAssigner::new(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.registry.contains_key(id)
    }

    /// Tear down whatever chart currently occupies the target and draw the
    /// replacement. A malformed or empty payload degrades this one target
    /// to a "no data" placeholder; the cycle continues with the rest.
    pub fn replace_chart(&mut self, backend: &mut dyn ChartBackend, target: &ChartTarget) {
        if let Some(old) = self.registry.remove(&target.id) {
            backend.destroy(old);
        }
        match self.build_spec(target) {
            Ok(spec) => match backend.draw(&target.id, &spec) {
                Ok(handle) => {
                    self.registry.insert(target.id.clone(), handle);
                }
                Err(e) => {
                    warn!("Chart backend failed for {}: {}", target.id, e);
                    backend.placeholder(&target.id, &no_data_message(target));
                }
            },
            Err(reason) => {
                if let Some(reason) = reason {
                    warn!("Degrading chart {} to placeholder: {}", target.id, reason);
                }
                backend.placeholder(&target.id, &no_data_message(target));
            }
        }
    }

    /// Replace every device metric chart from one metrics payload.
    pub fn replace_device_charts(&mut self, backend: &mut dyn ChartBackend, metrics: DeviceMetrics) {
        for target in device_chart_targets(metrics) {
            self.replace_chart(backend, &target);
        }
    }

    // Err(None) is plain "no data"; Err(Some(reason)) is malformed data
    // worth a log line. Both render the same placeholder.
    fn build_spec(&mut self, target: &ChartTarget) -> Result<ChartSpec, Option<String>> {
        match (&target.kind, &target.data) {
            (ChartKind::Doughnut, ChartData::Counts(counts)) => Ok(doughnut_spec(counts)),
            (ChartKind::Timeseries, ChartData::Series(series)) => line_spec(series),
            (ChartKind::Heatmap, ChartData::Series(series)) => heatmap_spec(series),
            (ChartKind::StackedBar, ChartData::Series(series)) => {
                stacked_bar_spec(series, &mut self.colors)
            }
            (kind, _) => Err(Some(format!("payload does not fit chart kind {:?}", kind))),
        }
    }
}

fn no_data_message(target: &ChartTarget) -> String {
    let name = match &target.data {
        ChartData::Series(series) if !series.name.is_empty() => series.name.clone(),
        _ => target.id.clone(),
    };
    format!("No data available for {}", name)
}

fn doughnut_spec(counts: &StatusCounts) -> ChartSpec {
    ChartSpec {
        traces: vec![Trace::Pie {
            labels: DOUGHNUT_LABELS.iter().map(|l| l.to_string()).collect(),
            values: counts.segments().to_vec(),
            hole: 0.7,
            marker: Marker {
                colors: Some(DOUGHNUT_COLORS.iter().map(|c| c.to_string()).collect()),
                ..Marker::default()
            },
        }],
        layout: Layout { title: String::new(), barmode: None },
    }
}

fn line_spec(series: &MetricSeries) -> Result<ChartSpec, Option<String>> {
    let dataset = series.datasets.first().ok_or(None)?;
    if dataset.data.len() != series.timestamps.len() {
        return Err(Some(format!(
            "{}: {} points against {} timestamps",
            series.name,
            dataset.data.len(),
            series.timestamps.len()
        )));
    }
    Ok(ChartSpec {
        traces: vec![Trace::Scatter {
            x: series.timestamps.clone(),
            y: dataset.data.clone(),
            mode: "lines+markers".to_string(),
            name: dataset.label.clone(),
        }],
        layout: Layout { title: series.name.clone(), barmode: None },
    })
}

/// X = time buckets, Y = the numeric secondary dimension (frequency),
/// Z = magnitude. Rows follow the label-sorted dataset order; cells a
/// series does not cover resolve to zero, never null.
fn heatmap_spec(series: &MetricSeries) -> Result<ChartSpec, Option<String>> {
    if series.datasets.is_empty() {
        return Err(None);
    }
    let mut rows: Vec<(i64, &crate::model::Dataset)> = Vec::with_capacity(series.datasets.len());
    for dataset in &series.datasets {
        let Some(value) = numeric_label(&dataset.label) else {
            return Err(Some(format!(
                "{}: non-numeric heatmap label {:?}",
                series.name, dataset.label
            )));
        };
        rows.push((value, dataset));
    }
    rows.sort_by_key(|(value, _)| *value);

    let z: Vec<Vec<f64>> = rows
        .iter()
        .map(|(_, dataset)| {
            (0..series.timestamps.len())
                .map(|t| dataset.data.get(t).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    Ok(ChartSpec {
        traces: vec![Trace::Heatmap {
            x: series.timestamps.clone(),
            y: rows.iter().map(|(value, _)| *value).collect(),
            z,
            colorscale: "Teal".to_string(),
        }],
        layout: Layout { title: series.name.clone(), barmode: None },
    })
}

/// One stacked bar trace per label, label-sorted, with session-stable
/// shade assignment.
fn stacked_bar_spec(
    series: &MetricSeries,
    colors: &mut ColorAssigner,
) -> Result<ChartSpec, Option<String>> {
    if series.datasets.is_empty() {
        return Err(None);
    }
    for dataset in &series.datasets {
        if dataset.data.len() != series.timestamps.len() {
            return Err(Some(format!(
                "{}: series {:?} has {} points against {} timestamps",
                series.name,
                dataset.label,
                dataset.data.len(),
                series.timestamps.len()
            )));
        }
    }
    let mut sorted: Vec<&crate::model::Dataset> = series.datasets.iter().collect();
    sorted.sort_by_key(|dataset| numeric_label(&dataset.label).unwrap_or(0));

    let traces = sorted
        .into_iter()
        .map(|dataset| Trace::Bar {
            x: series.timestamps.clone(),
            y: dataset.data.clone(),
            name: dataset.label.clone(),
            marker: Marker {
                color: Some(colors.color_for(&dataset.label)),
                ..Marker::default()
            },
        })
        .collect();

    Ok(ChartSpec {
        traces,
        layout: Layout {
            title: series.name.clone(),
            barmode: Some("stack".to_string()),
        },
    })
}

/// Slot and kind wiring for the six device metric charts.
pub fn device_chart_targets(metrics: DeviceMetrics) -> Vec<ChartTarget> {
    let target = |id: &str, kind: ChartKind, series: MetricSeries| ChartTarget {
        id: id.to_string(),
        kind,
        data: ChartData::Series(series),
    };
    vec![
        target("rxPackets", ChartKind::Timeseries, metrics.rx_packets),
        target("rssi", ChartKind::Timeseries, metrics.gw_rssi),
        target("snr", ChartKind::Timeseries, metrics.gw_snr),
        target("rxPacketsPerFreq", ChartKind::Heatmap, metrics.rx_packets_per_freq),
        target("rxPacketsPerDr", ChartKind::StackedBar, metrics.rx_packets_per_dr),
        target("errors", ChartKind::Timeseries, metrics.errors),
    ]
}
