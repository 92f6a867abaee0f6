use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

use super::types::{
    FacilityListResponse, FacilityResponse, MessageResponse, UserListResponse, UserResponse,
};
use super::validation::{
    sanitize_email, sanitize_integer, sanitize_string, validate_facility_payload,
};
use super::{ApiError, AppState};
use crate::db::InsertError;
use crate::models::UserRole;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.store().list_users().await?;
    Ok(Json(UserListResponse { users }))
}

/// GET /api/admin/facilities
pub async fn list_facilities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FacilityListResponse>, ApiError> {
    let facilities = state.store().list_facilities().await?;
    Ok(Json(FacilityListResponse { facilities }))
}

/// POST /api/admin/facilities
pub async fn create_facility(
    State(state): State<Arc<AppState>>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<FacilityResponse>), ApiError> {
    let errors = validate_facility_payload(&data);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let name = sanitize_string(data.get("name"), 150);
    let country = non_empty(sanitize_string(data.get("country"), 120));
    let city = non_empty(sanitize_string(data.get("city"), 120));

    if state.store().get_facility_by_name(&name).await?.is_some() {
        return Err(ApiError::conflict("Facility already exists."));
    }

    // The unique constraint still backs the pre-check against races.
    let facility = state
        .store()
        .create_facility(&name, country.as_deref(), city.as_deref())
        .await
        .map_err(|e| match e {
            InsertError::Conflict => ApiError::conflict("Facility already exists."),
            other => other.into(),
        })?;

    info!("Created facility {}", facility.name);

    Ok((StatusCode::CREATED, Json(FacilityResponse { facility })))
}

/// POST /api/admin/users
/// Create an account with a temporary password set by the admin.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let email = sanitize_email(data.get("email"));
    let temp_password = data
        .get("password")
        .and_then(Value::as_str)
        .or_else(|| data.get("temporary_password").and_then(Value::as_str))
        .filter(|p| !p.is_empty());
    let role_value = sanitize_string(data.get("role"), 50).to_lowercase();
    let mut facility_id = sanitize_integer(data.get("facility_id"), Some(1), None)
        .and_then(|v| i32::try_from(v).ok());

    if email.is_empty() {
        return Err(ApiError::bad_request("email is required."));
    }
    let Some(password) = temp_password else {
        return Err(ApiError::bad_request("temporary password is required."));
    };
    let Some(role) = UserRole::parse(&role_value) else {
        return Err(ApiError::bad_request("Invalid role."));
    };

    if role == UserRole::Reporter {
        let Some(id) = facility_id else {
            return Err(ApiError::bad_request("facility_id is required for reporter."));
        };
        if state.store().get_facility(id).await?.is_none() {
            return Err(ApiError::not_found("Facility not found."));
        }
    } else {
        // Non-reporters are never linked to a facility.
        facility_id = None;
    }

    let user = state
        .store()
        .create_user(&email, password, role, facility_id, state.security())
        .await
        .map_err(|e| match e {
            InsertError::Conflict => ApiError::conflict("Email already registered."),
            other => other.into(),
        })?;

    info!("Admin created {} account for {}", user.role, user.email);

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// DELETE /api/admin/facilities/{facility_id}
pub async fn delete_facility(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.store().get_facility(facility_id).await?.is_none() {
        return Err(ApiError::not_found("Facility not found."));
    }

    // Reports cascade with the facility. Linked reporter accounts block the
    // delete; unlinking them would leave reporters without a facility.
    if state.store().users_linked_to_facility(facility_id).await? > 0 {
        return Err(ApiError::conflict(
            "Facility has linked users and cannot be deleted.",
        ));
    }

    state.store().delete_facility(facility_id).await?;

    info!("Deleted facility {facility_id}");

    Ok(Json(MessageResponse {
        message: "Facility deleted.".to_string(),
    }))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
