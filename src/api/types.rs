use serde::Serialize;

use crate::models::{Facility, ResourceReport, User, UserRole};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub access_token: String,
    pub role: UserRole,
    pub facility_id: Option<i32>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub role: UserRole,
    pub facility_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct FacilityResponse {
    pub facility: Facility,
}

#[derive(Debug, Serialize)]
pub struct FacilityListResponse {
    pub facilities: Vec<Facility>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: ResourceReport,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub facilities: Vec<DashboardEntry>,
}

/// One facility with its latest snapshot joined in. Facilities without a
/// report keep null resource fields.
#[derive(Debug, Serialize)]
pub struct DashboardEntry {
    pub facility_id: i32,
    pub facility_name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub location: Option<String>,
    pub icu_beds_available: Option<i32>,
    pub ventilators_available: Option<i32>,
    pub staff_on_duty: Option<i32>,
    pub last_update: Option<String>,
    /// True iff a report exists and no ICU beds are available.
    pub critical: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub facility: FacilitySummary,
    pub days: i64,
    pub reports: Vec<ResourceReport>,
}

#[derive(Debug, Serialize)]
pub struct FacilitySummary {
    pub id: i32,
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
}
