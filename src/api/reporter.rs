use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::Value;

use super::auth::AuthContext;
use super::types::ReportResponse;
use super::validation::{sanitize_integer, validate_report_payload};
use super::{ApiError, AppState};
use crate::models::UserRole;

/// POST /api/reporter/reports
/// Overwrite the facility's current snapshot (insert if none exists).
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<ReportResponse>), ApiError> {
    let errors = validate_report_payload(&data);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let facility_id = sanitize_integer(data.get("facility_id"), Some(1), None)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| ApiError::bad_request("Invalid facility_id."))?;

    // Reporters write to their own linked facility only; admins write to any.
    if ctx.identity.role == Some(UserRole::Reporter) {
        let Some(own_facility) = ctx.identity.facility_id else {
            return Err(ApiError::forbidden_with(
                "Reporter is not linked to a facility.",
            ));
        };
        if own_facility != facility_id {
            return Err(ApiError::forbidden_with(
                "Reporter can only submit for their facility.",
            ));
        }
    }

    if state.store().get_facility(facility_id).await?.is_none() {
        return Err(ApiError::not_found("Facility not found."));
    }

    let icu_beds_available = count_field(&data, "icu_beds_available")?;
    let ventilators_available = count_field(&data, "ventilators_available")?;
    let staff_on_duty = count_field(&data, "staff_on_duty")?;

    let report = state
        .store()
        .upsert_report(
            facility_id,
            icu_beds_available,
            ventilators_available,
            staff_on_duty,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReportResponse { report })))
}

/// GET /api/reporter/reports/me
/// Latest report for the caller's facility; admins name a facility via the
/// query string instead.
pub async fn my_latest_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ReportResponse>, ApiError> {
    let facility_id = if ctx.identity.role == Some(UserRole::Reporter) {
        ctx.identity.facility_id.ok_or_else(|| {
            ApiError::forbidden_with("Reporter is not linked to a facility.")
        })?
    } else {
        params
            .get("facility_id")
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or_else(|| ApiError::bad_request("facility_id is required for this request."))?
    };

    let report = state
        .store()
        .latest_report(facility_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No report found."))?;

    Ok(Json(ReportResponse { report }))
}

fn count_field(data: &Value, field: &str) -> Result<i32, ApiError> {
    sanitize_integer(data.get(field), Some(0), Some(10_000))
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| {
            ApiError::bad_request(format!("{field} must be a non-negative integer (max 10000)."))
        })
}
