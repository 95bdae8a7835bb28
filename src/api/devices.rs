//! Device API endpoints.
//!
//! Reads degrade to the sample set; destructive writes require the store.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ApiResponse, ApiResult};
use crate::db::{Provenance, Sourced};
use crate::errors::AppError;
use crate::models::{CreateDeviceRequest, Device, UpdateDeviceRequest};
use crate::sample;
use crate::AppState;

/// GET /api/devices - List all devices.
pub async fn list_devices(State(state): State<AppState>) -> ApiResult<Vec<Device>> {
    let Sourced {
        value: devices,
        source,
    } = state
        .data
        .read(
            |repo| async move { repo.list_devices().await },
            sample::sample_devices,
        )
        .await;

    let count = devices.len();

    Ok(ApiResponse::new(devices)
        .with_count(count)
        .with_message(format!("{} devices found", count))
        .with_source(source))
}

/// GET /api/devices/:id - Get a single device.
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Device> {
    let store_id = id.clone();
    let sample_id = id.clone();

    let Sourced {
        value: device,
        source,
    } = state
        .data
        .read(
            move |repo| async move { repo.get_device(&store_id).await },
            move || sample::find_sample_device(&sample_id),
        )
        .await;

    match device {
        Some(device) => Ok(ApiResponse::new(device)
            .with_message(format!("Device {} found", id))
            .with_source(source)),
        None => Err(AppError::NotFound(format!("Device {} not found", id))),
    }
}

/// POST /api/devices - Register a new device. Store required.
pub async fn create_device(
    State(state): State<AppState>,
    Json(request): Json<CreateDeviceRequest>,
) -> ApiResult<Device> {
    let repo = state.data.store()?;

    if request.id.trim().is_empty()
        || request.name.trim().is_empty()
        || request.kind.trim().is_empty()
        || request.location.trim().is_empty()
    {
        return Err(AppError::Validation(
            "The id, name, type and location fields are required".to_string(),
        ));
    }
    validate_battery(request.battery)?;

    let device = repo.create_device(&request).await?;

    Ok(ApiResponse::new(device)
        .with_message("Device created")
        .with_source(Provenance::Database))
}

/// PUT /api/devices/:id - Update a device. Store required.
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDeviceRequest>,
) -> ApiResult<Device> {
    let repo = state.data.store()?;

    if let Some(battery) = request.battery {
        validate_battery(battery)?;
    }

    let device = repo.update_device(&id, &request).await?;

    Ok(ApiResponse::new(device)
        .with_message("Device updated")
        .with_source(Provenance::Database))
}

/// DELETE /api/devices/:id - Delete a device. Store required.
pub async fn delete_device(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let repo = state.data.store()?;

    repo.delete_device(&id).await?;

    Ok(ApiResponse::new(())
        .with_message(format!("Device {} deleted", id))
        .with_source(Provenance::Database))
}

fn validate_battery(battery: i64) -> Result<(), AppError> {
    if !(0..=100).contains(&battery) {
        return Err(AppError::Validation(
            "battery must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}
