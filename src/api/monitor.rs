use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Duration, Utc};

use super::types::{DashboardEntry, DashboardResponse, FacilitySummary, HistoryResponse};
use super::{ApiError, AppState};
use crate::db::rfc3339;

/// GET /api/monitor/dashboard
/// Every facility joined with its latest snapshot.
pub async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let facilities = state.store().list_facilities().await?;
    let latest = state.store().latest_reports_by_facility().await?;

    let entries = facilities
        .into_iter()
        .map(|facility| {
            let report = latest.get(&facility.id);
            let location = location_of(facility.city.as_deref(), facility.country.as_deref());

            DashboardEntry {
                facility_id: facility.id,
                facility_name: facility.name,
                country: facility.country,
                city: facility.city,
                location,
                icu_beds_available: report.map(|r| r.icu_beds_available),
                ventilators_available: report.map(|r| r.ventilators_available),
                staff_on_duty: report.map(|r| r.staff_on_duty),
                last_update: report.map(|r| r.updated_at.clone()),
                critical: report.is_some_and(|r| r.icu_beds_available == 0),
            }
        })
        .collect();

    Ok(Json(DashboardResponse { facilities: entries }))
}

/// GET /api/monitor/dashboard/history?facility_id&days
/// Reports retained for one facility within the window, oldest first. With
/// the single-snapshot write model this holds at most one row per facility.
pub async fn dashboard_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let facility_id = params
        .get("facility_id")
        .and_then(|v| v.parse::<i32>().ok())
        .ok_or_else(|| ApiError::bad_request("facility_id is required."))?;

    // An unparseable `days` falls back to the default window.
    let days = params
        .get("days")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(7);
    if days <= 0 {
        return Err(ApiError::bad_request("days must be a positive integer."));
    }

    let facility = state
        .store()
        .get_facility(facility_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Facility not found."))?;

    let since = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| ApiError::bad_request("days is out of range."))?;

    let reports = state
        .store()
        .reports_since(facility_id, &rfc3339(since))
        .await?;

    Ok(Json(HistoryResponse {
        facility: FacilitySummary {
            id: facility.id,
            name: facility.name,
            country: facility.country,
            city: facility.city,
        },
        days,
        reports,
    }))
}

fn location_of(city: Option<&str>, country: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [city, country].into_iter().flatten().collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::location_of;

    #[test]
    fn location_joins_present_parts() {
        assert_eq!(
            location_of(Some("London"), Some("UK")),
            Some("London, UK".to_string())
        );
        assert_eq!(location_of(None, Some("UK")), Some("UK".to_string()));
        assert_eq!(location_of(Some("London"), None), Some("London".to_string()));
        assert_eq!(location_of(None, None), None);
    }
}
