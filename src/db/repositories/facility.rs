use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::InsertError;
use crate::db::now_rfc3339;
use crate::entities::{facilities, prelude::*};
use crate::models::Facility;

pub struct FacilityRepository {
    conn: DatabaseConnection,
}

impl FacilityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        name: &str,
        country: Option<&str>,
        city: Option<&str>,
    ) -> Result<Facility, InsertError> {
        let active = facilities::ActiveModel {
            name: Set(name.to_string()),
            country: Set(country.map(ToString::to_string)),
            city: Set(city.map(ToString::to_string)),
            created_at: Set(now_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(InsertError::from_db)?;

        Ok(Facility::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Facility>> {
        let facility = Facilities::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query facility by id")?;

        Ok(facility.map(Facility::from))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Facility>> {
        let facility = Facilities::find()
            .filter(facilities::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query facility by name")?;

        Ok(facility.map(Facility::from))
    }

    pub async fn list_all(&self) -> Result<Vec<Facility>> {
        let rows = Facilities::find()
            .order_by_asc(facilities::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list facilities")?;

        Ok(rows.into_iter().map(Facility::from).collect())
    }

    /// Delete a facility; dependent reports cascade with it.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Facilities::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete facility")?;

        Ok(res.rows_affected > 0)
    }
}
