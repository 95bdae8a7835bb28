//! Fixed sample data served when the store is unavailable.
//!
//! Process-wide constant state, read-only after initialization. The sample
//! set is never written to; destructive operations require a store.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use crate::models::{Device, DeviceStatus, Role, SignalQuality};

static SAMPLE_DEVICES: LazyLock<Vec<Device>> = LazyLock::new(|| {
    let now = Utc::now();
    vec![
        sample_device(
            "DEV-001",
            "Sensor Temperatura Exterior",
            "Sensor Temperatura",
            "Jardín",
            DeviceStatus::Online,
            Some(24.3),
            Some("°C"),
            85,
            SignalQuality::Excellent,
            now,
        ),
        sample_device(
            "DEV-002",
            "Sensor Humedad Invernadero",
            "Sensor Humedad",
            "Invernadero",
            DeviceStatus::Online,
            Some(68.5),
            Some("%"),
            92,
            SignalQuality::Good,
            now,
        ),
        sample_device(
            "DEV-003",
            "Cámara Seguridad Principal",
            "Cámara",
            "Entrada",
            DeviceStatus::Warning,
            None,
            None,
            15,
            SignalQuality::Fair,
            now,
        ),
    ]
});

#[allow(clippy::too_many_arguments)]
fn sample_device(
    id: &str,
    name: &str,
    kind: &str,
    location: &str,
    status: DeviceStatus,
    value: Option<f64>,
    unit: Option<&str>,
    battery: i64,
    signal: SignalQuality,
    now: DateTime<Utc>,
) -> Device {
    Device {
        id: id.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        location: location.to_string(),
        status,
        value,
        unit: unit.map(str::to_string),
        battery,
        signal,
        last_reading: now,
        created_at: now,
        updated_at: now,
    }
}

/// The fixed sample device set.
pub fn sample_devices() -> Vec<Device> {
    SAMPLE_DEVICES.clone()
}

/// Find a sample device by id.
pub fn find_sample_device(id: &str) -> Option<Device> {
    SAMPLE_DEVICES.iter().find(|d| d.id == id).cloned()
}

/// A local fallback account. Read-only; the table is only consulted when the
/// store cannot authenticate a user.
pub struct LocalUser {
    pub username: &'static str,
    pub password: &'static str,
    pub role: Role,
    pub email: &'static str,
}

/// The fixed local user table.
pub const LOCAL_USERS: &[LocalUser] = &[
    LocalUser {
        username: "admin",
        password: "admin123",
        role: Role::Admin,
        email: "admin@iot.local",
    },
    LocalUser {
        username: "user",
        password: "user123",
        role: Role::User,
        email: "user@iot.local",
    },
    LocalUser {
        username: "demo",
        password: "demo123",
        role: Role::Demo,
        email: "demo@iot.local",
    },
];
