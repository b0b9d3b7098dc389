use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single boolean-validity probe result with human-readable detail text.
///
/// The backend spells the flag `reachable` for server health probes,
/// `valid` for credential probes, and `validity` for the Telegram check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    #[serde(alias = "reachable", alias = "valid", alias = "validity")]
    pub ok: bool,
    #[serde(default)]
    pub details: String,
}

/// ChirpStack subsystem probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpstackReport {
    pub server_health: StatusCheck,
    pub api_key_valid: StatusCheck,
}

/// InfluxDB subsystem probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxDbReport {
    pub server_health: StatusCheck,
    pub auth_valid: StatusCheck,
    pub org_valid: StatusCheck,
    pub bucket_valid: StatusCheck,
}

/// RabbitMQ subsystem probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RabbitMqReport {
    pub server_health: StatusCheck,
}

/// Full configuration check report.
///
/// The wire format is a 4-element array in fixed subsystem order; the
/// Telegram entry is a flat `{validity, details}` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ConfigReportWire")]
pub struct ConfigReport {
    pub chirpstack: ChirpstackReport,
    pub influxdb: InfluxDbReport,
    pub rabbitmq: RabbitMqReport,
    pub telegram: StatusCheck,
}

#[derive(Deserialize)]
struct ConfigReportWire(ChirpstackReport, InfluxDbReport, RabbitMqReport, StatusCheck);

impl From<ConfigReportWire> for ConfigReport {
    fn from(wire: ConfigReportWire) -> Self {
        Self {
            chirpstack: wire.0,
            influxdb: wire.1,
            rabbitmq: wire.2,
            telegram: wire.3,
        }
    }
}

/// Alert severity, doubling as the card style class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Unknown,
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            _ => Severity::Unknown,
        }
    }
}

impl Severity {
    pub fn class(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info | Severity::Unknown => "info",
        }
    }
}

/// A device-scoped alert. The wire format is a positional 6-tuple
/// `[device, gateway, issue, message, severity, uid]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DeviceAlertWire")]
pub struct DeviceAlert {
    pub device: String,
    pub gateway: String,
    pub issue: String,
    pub message: String,
    pub severity: Severity,
    pub uid: String,
}

#[derive(Deserialize)]
struct DeviceAlertWire(String, String, String, String, Severity, String);

impl From<DeviceAlertWire> for DeviceAlert {
    fn from(wire: DeviceAlertWire) -> Self {
        Self {
            device: wire.0,
            gateway: wire.1,
            issue: wire.2,
            message: wire.3,
            severity: wire.4,
            uid: wire.5,
        }
    }
}

/// A gateway-scoped alert. The wire format is a positional 5-tuple
/// `[gateway, issue, message, severity, uid]`; there is no gateway field
/// beyond the subject itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GatewayAlertWire")]
pub struct GatewayAlert {
    pub gateway: String,
    pub issue: String,
    pub message: String,
    pub severity: Severity,
    pub uid: String,
}

#[derive(Deserialize)]
struct GatewayAlertWire(String, String, String, Severity, String);

impl From<GatewayAlertWire> for GatewayAlert {
    fn from(wire: GatewayAlertWire) -> Self {
        Self {
            gateway: wire.0,
            issue: wire.1,
            message: wire.2,
            severity: wire.3,
            uid: wire.4,
        }
    }
}

/// Entity status counts for one entity class (devices or gateways).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub offline: u64,
    pub online: u64,
    pub never_seen: u64,
    pub total: u64,
}

impl StatusCounts {
    /// Doughnut segment order: offline, online, never seen.
    pub fn segments(&self) -> [u64; 3] {
        [self.offline, self.online, self.never_seen]
    }

    pub fn is_consistent(&self) -> bool {
        self.offline + self.online + self.never_seen == self.total
    }
}

/// Fleet-wide status counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FleetStatus {
    pub devices: StatusCounts,
    pub gateways: StatusCounts,
}

/// One named chart payload: shared timestamps plus labelled series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timestamps: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// Link metrics for one device, keyed by chart slot.
///
/// Any series the backend omits deserializes as an empty `MetricSeries`,
/// which renders as the "no data" placeholder downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceMetrics {
    #[serde(default, rename = "rxPackets")]
    pub rx_packets: MetricSeries,
    #[serde(default, rename = "gwRssi")]
    pub gw_rssi: MetricSeries,
    #[serde(default, rename = "gwSnr")]
    pub gw_snr: MetricSeries,
    #[serde(default, rename = "rxPacketsPerFreq")]
    pub rx_packets_per_freq: MetricSeries,
    #[serde(default, rename = "rxPacketsPerDr")]
    pub rx_packets_per_dr: MetricSeries,
    #[serde(default)]
    pub errors: MetricSeries,
}
