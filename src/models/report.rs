use serde::Serialize;

use crate::entities::resource_reports;

/// Latest known resource counts for one facility. The write path keeps a
/// single current row per facility; prior values are overwritten, not
/// archived.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub id: i32,
    pub facility_id: i32,
    pub icu_beds_available: i32,
    pub ventilators_available: i32,
    pub staff_on_duty: i32,
    pub updated_at: String,
}

impl From<resource_reports::Model> for ResourceReport {
    fn from(model: resource_reports::Model) -> Self {
        Self {
            id: model.id,
            facility_id: model.facility_id,
            icu_beds_available: model.icu_beds_available,
            ventilators_available: model.ventilators_available,
            staff_on_duty: model.staff_on_duty,
            updated_at: model.updated_at,
        }
    }
}
