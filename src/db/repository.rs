//! Database repository for CRUD operations.
//!
//! Uses prepared statements with bound parameters for all queries.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CreateDeviceRequest, Device, DeviceStatus, Role, SignalQuality, UpdateDeviceRequest, User,
};

const DEVICE_COLUMNS: &str =
    "id, name, type, location, status, value, unit, battery, signal, last_reading, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Cheap liveness probe for health checks.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Release all pooled connections. Idempotent.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ==================== DEVICE OPERATIONS ====================

    /// List all devices, newest first.
    pub async fn list_devices(&self) -> Result<Vec<Device>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(device_from_row).collect())
    }

    /// Get a device by ID.
    pub async fn get_device(&self, id: &str) -> Result<Option<Device>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(device_from_row))
    }

    /// Register a new device. Fails with Conflict if the id already exists.
    pub async fn create_device(&self, request: &CreateDeviceRequest) -> Result<Device, AppError> {
        if self.get_device(&request.id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A device with ID {} already exists",
                request.id
            )));
        }

        let now = Utc::now();

        sqlx::query(
            "INSERT INTO devices (id, name, type, location, status, value, unit, battery, signal, last_reading, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id)
        .bind(&request.name)
        .bind(&request.kind)
        .bind(&request.location)
        .bind(request.status.as_str())
        .bind(request.value)
        .bind(&request.unit)
        .bind(request.battery)
        .bind(request.signal.as_str())
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Device {
            id: request.id.clone(),
            name: request.name.clone(),
            kind: request.kind.clone(),
            location: request.location.clone(),
            status: request.status,
            value: request.value,
            unit: request.unit.clone(),
            battery: request.battery,
            signal: request.signal,
            last_reading: now,
            created_at: now,
            updated_at: now,
        })
    }

    /// Update a device. Absent request fields keep their current values;
    /// a new reading value refreshes last_reading.
    pub async fn update_device(
        &self,
        id: &str,
        request: &UpdateDeviceRequest,
    ) -> Result<Device, AppError> {
        let existing = self
            .get_device(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;

        let now = Utc::now();

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let kind = request.kind.as_ref().unwrap_or(&existing.kind);
        let location = request.location.as_ref().unwrap_or(&existing.location);
        let status = request.status.unwrap_or(existing.status);
        let value = request.value.or(existing.value);
        let unit = request.unit.clone().or(existing.unit.clone());
        let battery = request.battery.unwrap_or(existing.battery);
        let signal = request.signal.unwrap_or(existing.signal);
        let last_reading = if request.value.is_some() {
            now
        } else {
            existing.last_reading
        };

        let result = sqlx::query(
            "UPDATE devices SET name = ?, type = ?, location = ?, status = ?, value = ?, \
             unit = ?, battery = ?, signal = ?, last_reading = ?, updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(kind)
        .bind(location)
        .bind(status.as_str())
        .bind(value)
        .bind(&unit)
        .bind(battery)
        .bind(signal.as_str())
        .bind(last_reading)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Device {} not found", id)));
        }

        Ok(Device {
            id: id.to_string(),
            name: name.clone(),
            kind: kind.clone(),
            location: location.clone(),
            status,
            value,
            unit,
            battery,
            signal,
            last_reading,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a device.
    pub async fn delete_device(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Device {} not found", id)));
        }

        Ok(())
    }

    // ==================== USER OPERATIONS ====================

    /// Look up a user by exact username. Case-sensitive.
    pub async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, password, role, email, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Append to the login audit log. Never read back.
    pub async fn record_login_attempt(
        &self,
        username: &str,
        success: bool,
        ip: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO login_attempts (username, success, ip_address, attempt_time) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(success as i32)
        .bind(ip)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Helper functions for row conversion

fn device_from_row(row: &sqlx::sqlite::SqliteRow) -> Device {
    let status: String = row.get("status");
    let signal: String = row.get("signal");
    let last_reading: DateTime<Utc> = row.get("last_reading");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Device {
        id: row.get("id"),
        name: row.get("name"),
        kind: row.get("type"),
        location: row.get("location"),
        status: DeviceStatus::from_str(&status).unwrap_or_default(),
        value: row.get("value"),
        unit: row.get("unit"),
        battery: row.get("battery"),
        signal: SignalQuality::from_str(&signal).unwrap_or_default(),
        last_reading,
        created_at,
        updated_at,
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    let created_at: DateTime<Utc> = row.get("created_at");

    User {
        id: row.get("id"),
        username: row.get("username"),
        password: row.get("password"),
        role: Role::from_str(&role).unwrap_or(Role::User),
        email: row.get("email"),
        created_at,
    }
}
