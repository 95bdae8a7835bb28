//! Dashboard snapshot models.
//!
//! A snapshot is derived per request from the current device collection; it
//! is never persisted.

use serde::Serialize;

use super::{DeviceStatus, SignalQuality};

/// Direction indicator rendered next to a KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Positive,
    Neutral,
    Negative,
}

/// A measured KPI (temperature, humidity).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureKpi {
    pub current: f64,
    pub unit: String,
    pub trend: Trend,
    pub change: f64,
}

/// Device availability KPI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCountKpi {
    pub current: usize,
    pub total: usize,
    pub trend: Trend,
    pub change: f64,
}

/// Alert KPI split into warning and critical (offline) counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertKpi {
    pub current: usize,
    pub critical: usize,
    pub warning: usize,
    pub trend: Trend,
}

/// The KPI block of a dashboard snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub temperature: MeasureKpi,
    pub humidity: MeasureKpi,
    pub active_devices: DeviceCountKpi,
    pub alerts: AlertKpi,
}

/// Compact device row for the dashboard table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub status: DeviceStatus,
    pub last_reading: String,
    pub value: f64,
    pub unit: String,
    pub battery: i64,
    pub signal: SignalQuality,
}

/// One synthesized hourly history point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub time: String,
    pub hour: u32,
    pub temperature: f64,
    pub humidity: f64,
}

/// Client-facing dashboard settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    pub refresh_interval: u32,
    pub temperature_unit: String,
    pub timezone: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval: 30,
            temperature_unit: "celsius".to_string(),
            timezone: "Europe/Madrid".to_string(),
        }
    }
}

/// The full dashboard snapshot returned by GET /api/dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub kpis: Kpis,
    pub devices: Vec<DeviceSummary>,
    pub temperature_history: Vec<HistoryPoint>,
    pub settings: DashboardSettings,
}
