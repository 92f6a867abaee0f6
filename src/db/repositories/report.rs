use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::db::now_rfc3339;
use crate::entities::{prelude::*, resource_reports};
use crate::models::ResourceReport;

pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Overwrite the current snapshot for a facility, inserting one if none
    /// exists. A single statement guarded by the unique index on
    /// `facility_id`, so concurrent submissions are last-writer-wins and can
    /// never leave two rows behind.
    pub async fn upsert(
        &self,
        facility_id: i32,
        icu_beds_available: i32,
        ventilators_available: i32,
        staff_on_duty: i32,
    ) -> Result<ResourceReport> {
        let active = resource_reports::ActiveModel {
            facility_id: Set(facility_id),
            icu_beds_available: Set(icu_beds_available),
            ventilators_available: Set(ventilators_available),
            staff_on_duty: Set(staff_on_duty),
            updated_at: Set(now_rfc3339()),
            ..Default::default()
        };

        ResourceReports::insert(active)
            .on_conflict(
                OnConflict::column(resource_reports::Column::FacilityId)
                    .update_columns([
                        resource_reports::Column::IcuBedsAvailable,
                        resource_reports::Column::VentilatorsAvailable,
                        resource_reports::Column::StaffOnDuty,
                        resource_reports::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to upsert resource report")?;

        let model = ResourceReports::find()
            .filter(resource_reports::Column::FacilityId.eq(facility_id))
            .one(&self.conn)
            .await
            .context("Failed to load upserted report")?
            .with_context(|| format!("Upserted report missing for facility {facility_id}"))?;

        Ok(ResourceReport::from(model))
    }

    pub async fn latest_for_facility(&self, facility_id: i32) -> Result<Option<ResourceReport>> {
        let report = ResourceReports::find()
            .filter(resource_reports::Column::FacilityId.eq(facility_id))
            .order_by_desc(resource_reports::Column::UpdatedAt)
            .one(&self.conn)
            .await
            .context("Failed to query latest report for facility")?;

        Ok(report.map(ResourceReport::from))
    }

    /// Latest report per facility. Rows arrive newest-first, so the first row
    /// seen for a facility wins.
    pub async fn latest_by_facility(&self) -> Result<HashMap<i32, ResourceReport>> {
        let rows = ResourceReports::find()
            .order_by_desc(resource_reports::Column::UpdatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query latest reports")?;

        let mut latest = HashMap::new();
        for row in rows {
            let facility_id = row.facility_id;
            latest
                .entry(facility_id)
                .or_insert_with(|| ResourceReport::from(row));
        }

        Ok(latest)
    }

    /// Reports for one facility with `updated_at >= cutoff`, oldest first.
    /// Timestamps are fixed-width RFC 3339, so the string comparison follows
    /// time order.
    pub async fn for_facility_since(
        &self,
        facility_id: i32,
        cutoff: &str,
    ) -> Result<Vec<ResourceReport>> {
        let rows = ResourceReports::find()
            .filter(resource_reports::Column::FacilityId.eq(facility_id))
            .filter(resource_reports::Column::UpdatedAt.gte(cutoff))
            .order_by_asc(resource_reports::Column::UpdatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query report history")?;

        Ok(rows.into_iter().map(ResourceReport::from).collect())
    }
}
