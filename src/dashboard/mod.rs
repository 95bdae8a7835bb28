//! Dashboard aggregation engine.
//!
//! Derives the KPI snapshot from whatever device collection the data source
//! yields (store or sample), plus a synthesized hourly history. The history
//! keeps a deterministic sinusoidal shape; only the noise on top of it is
//! random, and the noise source is injectable so tests can assert exact
//! values.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;

use crate::models::{
    AlertKpi, DashboardData, DashboardSettings, Device, DeviceCountKpi, DeviceStatus,
    DeviceSummary, HistoryPoint, Kpis, MeasureKpi, Trend,
};

/// Reported when no device qualifies for the temperature average.
pub const DEFAULT_AVG_TEMPERATURE: f64 = 23.5;

/// Reported when no device qualifies for the humidity average.
pub const DEFAULT_AVG_HUMIDITY: f64 = 65.0;

/// Number of synthesized hourly history points.
const HISTORY_HOURS: i64 = 24;

/// Noise source for the synthesized history.
pub trait Noise {
    /// A sample uniformly distributed in [-amplitude/2, amplitude/2].
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Production noise source backed by the thread RNG.
pub struct ThreadRngNoise;

impl Noise for ThreadRngNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        (rand::thread_rng().gen::<f64>() - 0.5) * amplitude
    }
}

/// Noiseless source for deterministic tests.
pub struct ZeroNoise;

impl Noise for ZeroNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Mean reading over temperature devices (unit °C, value present).
pub fn avg_temperature(devices: &[Device]) -> f64 {
    mean(devices.iter().filter_map(|d| match d.unit.as_deref() {
        Some("°C") => d.value,
        _ => None,
    }))
    .unwrap_or(DEFAULT_AVG_TEMPERATURE)
}

/// Mean reading over humidity devices (unit %, humidity type, value present).
pub fn avg_humidity(devices: &[Device]) -> f64 {
    mean(devices.iter().filter_map(|d| {
        match d.unit.as_deref() {
            Some("%") if is_humidity_type(&d.kind) => d.value,
            _ => None,
        }
    }))
    .unwrap_or(DEFAULT_AVG_HUMIDITY)
}

/// Case-insensitive substring match on the device type. The sample set uses
/// Spanish type labels, so "humedad" qualifies alongside "humidity".
fn is_humidity_type(kind: &str) -> bool {
    let kind = kind.to_lowercase();
    kind.contains("humidity") || kind.contains("humedad")
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Synthesize 24 hourly history points counting backward from `now`.
/// Sinusoidal shape around the base temperature and a 65 % humidity midline,
/// one decimal of precision.
pub fn temperature_history(
    base_temperature: f64,
    now: DateTime<Utc>,
    noise: &mut dyn Noise,
) -> Vec<HistoryPoint> {
    let mut history = Vec::with_capacity(HISTORY_HOURS as usize);

    for i in (0..HISTORY_HOURS).rev() {
        let time = now - Duration::hours(i);
        let phase = i as f64;
        let temperature = base_temperature + (phase * 0.5).sin() * 3.0 + noise.sample(2.0);
        let humidity = 65.0 + (phase * 0.3).sin() * 10.0 + noise.sample(5.0);

        history.push(HistoryPoint {
            time: time.to_rfc3339(),
            hour: time.hour(),
            temperature: round1(temperature),
            humidity: round1(humidity),
        });
    }

    history
}

/// Build the full dashboard snapshot from a device collection of unknown
/// provenance.
pub fn build_dashboard(
    devices: &[Device],
    now: DateTime<Utc>,
    noise: &mut dyn Noise,
) -> DashboardData {
    let total = devices.len();
    let active = count_status(devices, DeviceStatus::Online);
    let warning = count_status(devices, DeviceStatus::Warning);
    let offline = count_status(devices, DeviceStatus::Offline);
    let alerts = warning + offline;

    let avg_temp = avg_temperature(devices);
    let avg_hum = avg_humidity(devices);

    // TODO: compute trend/change from the history instead of the placeholder constants
    DashboardData {
        kpis: Kpis {
            temperature: MeasureKpi {
                current: round1(avg_temp),
                unit: "°C".to_string(),
                trend: Trend::Positive,
                change: 1.2,
            },
            humidity: MeasureKpi {
                current: round1(avg_hum),
                unit: "%".to_string(),
                trend: Trend::Positive,
                change: -2.1,
            },
            active_devices: DeviceCountKpi {
                current: active,
                total,
                trend: Trend::Positive,
                change: 0.0,
            },
            alerts: AlertKpi {
                current: alerts,
                critical: offline,
                warning,
                trend: if alerts == 0 {
                    Trend::Positive
                } else {
                    Trend::Neutral
                },
            },
        },
        devices: devices.iter().map(summarize_device).collect(),
        temperature_history: temperature_history(avg_temp, now, noise),
        settings: DashboardSettings::default(),
    }
}

fn count_status(devices: &[Device], status: DeviceStatus) -> usize {
    devices.iter().filter(|d| d.status == status).count()
}

fn summarize_device(device: &Device) -> DeviceSummary {
    DeviceSummary {
        id: device.id.clone(),
        name: device.name.clone(),
        kind: device.kind.clone(),
        location: device.location.clone(),
        status: device.status,
        last_reading: device.last_reading.format("%Y-%m-%d %H:%M:%S").to_string(),
        value: device.value.unwrap_or(0.0),
        unit: device.unit.clone().unwrap_or_default(),
        battery: device.battery,
        signal: device.signal,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalQuality;
    use crate::sample::sample_devices;

    fn device(unit: Option<&str>, value: Option<f64>, kind: &str, status: DeviceStatus) -> Device {
        let now = Utc::now();
        Device {
            id: "T-1".to_string(),
            name: "test".to_string(),
            kind: kind.to_string(),
            location: "lab".to_string(),
            status,
            value,
            unit: unit.map(str::to_string),
            battery: 100,
            signal: SignalQuality::Good,
            last_reading: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_avg_temperature_mean() {
        let devices = vec![
            device(Some("°C"), Some(20.0), "Temperature Sensor", DeviceStatus::Online),
            device(Some("°C"), Some(30.0), "Temperature Sensor", DeviceStatus::Online),
        ];
        assert_eq!(avg_temperature(&devices), 25.0);
    }

    #[test]
    fn test_avg_defaults_on_empty_collection() {
        assert_eq!(avg_temperature(&[]), 23.5);
        assert_eq!(avg_humidity(&[]), 65.0);
    }

    #[test]
    fn test_avg_ignores_null_values_and_foreign_units() {
        let devices = vec![
            device(Some("°C"), None, "Temperature Sensor", DeviceStatus::Online),
            device(Some("%"), Some(40.0), "Humidity Sensor", DeviceStatus::Online),
        ];
        // No qualifying temperature reading, so the fixed default applies
        assert_eq!(avg_temperature(&devices), 23.5);
        assert_eq!(avg_humidity(&devices), 40.0);
    }

    #[test]
    fn test_avg_humidity_matches_spanish_type_labels() {
        let devices = sample_devices();
        assert_eq!(avg_humidity(&devices), 68.5);
        assert_eq!(avg_temperature(&devices), 24.3);
    }

    #[test]
    fn test_history_shape_with_zero_noise() {
        let now = Utc::now();
        let history = temperature_history(24.3, now, &mut ZeroNoise);

        assert_eq!(history.len(), 24);

        // Newest point (i = 0): sin(0) = 0, so exactly the base values
        let newest = history.last().unwrap();
        assert_eq!(newest.temperature, 24.3);
        assert_eq!(newest.humidity, 65.0);
        assert_eq!(newest.hour, now.hour());

        // Oldest point (i = 23) follows the sinusoid exactly
        let oldest = &history[0];
        assert_eq!(oldest.temperature, round1(24.3 + (23.0f64 * 0.5).sin() * 3.0));
        assert_eq!(oldest.humidity, round1(65.0 + (23.0f64 * 0.3).sin() * 10.0));
    }

    #[test]
    fn test_build_dashboard_counts_and_defaults() {
        let snapshot = build_dashboard(&[], Utc::now(), &mut ZeroNoise);

        assert_eq!(snapshot.kpis.temperature.current, 23.5);
        assert_eq!(snapshot.kpis.humidity.current, 65.0);
        assert_eq!(snapshot.kpis.active_devices.current, 0);
        assert_eq!(snapshot.kpis.active_devices.total, 0);
        assert_eq!(snapshot.kpis.alerts.current, 0);
        assert_eq!(snapshot.kpis.alerts.trend, Trend::Positive);
        assert_eq!(snapshot.temperature_history.len(), 24);
        assert!(snapshot.devices.is_empty());
    }

    #[test]
    fn test_build_dashboard_sample_set() {
        let devices = sample_devices();
        let snapshot = build_dashboard(&devices, Utc::now(), &mut ZeroNoise);

        assert_eq!(snapshot.kpis.active_devices.current, 2);
        assert_eq!(snapshot.kpis.active_devices.total, 3);
        assert_eq!(snapshot.kpis.alerts.current, 1);
        assert_eq!(snapshot.kpis.alerts.warning, 1);
        assert_eq!(snapshot.kpis.alerts.critical, 0);
        assert_eq!(snapshot.kpis.alerts.trend, Trend::Neutral);
        assert_eq!(snapshot.kpis.temperature.current, 24.3);
        assert_eq!(snapshot.kpis.humidity.current, 68.5);

        // Devices without a reading fall back to 0 / empty unit in the table
        let camera = &snapshot.devices[2];
        assert_eq!(camera.value, 0.0);
        assert_eq!(camera.unit, "");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = DashboardSettings::default();
        assert_eq!(settings.refresh_interval, 30);
        assert_eq!(settings.temperature_unit, "celsius");
        assert_eq!(settings.timezone, "Europe/Madrid");
    }
}
