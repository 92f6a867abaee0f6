use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::config::SecurityConfig;
use crate::models::{Facility, ResourceReport, User, UserRole};

pub mod migrator;
pub mod repositories;

pub use repositories::InsertError;

/// Fixed-width RFC 3339 in UTC; lexicographic order on these strings follows
/// chronological order.
pub(crate) fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now_rfc3339() -> String {
    rfc3339(Utc::now())
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn facility_repo(&self) -> repositories::facility::FacilityRepository {
        repositories::facility::FacilityRepository::new(self.conn.clone())
    }

    fn report_repo(&self) -> repositories::report::ReportRepository {
        repositories::report::ReportRepository::new(self.conn.clone())
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        facility_id: Option<i32>,
        security: &SecurityConfig,
    ) -> Result<User, InsertError> {
        self.user_repo()
            .create(email, password, role, facility_id, security)
            .await
    }

    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().authenticate(email, password).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn users_linked_to_facility(&self, facility_id: i32) -> Result<u64> {
        self.user_repo().count_for_facility(facility_id).await
    }

    pub async fn create_facility(
        &self,
        name: &str,
        country: Option<&str>,
        city: Option<&str>,
    ) -> Result<Facility, InsertError> {
        self.facility_repo().create(name, country, city).await
    }

    pub async fn get_facility(&self, id: i32) -> Result<Option<Facility>> {
        self.facility_repo().get(id).await
    }

    pub async fn get_facility_by_name(&self, name: &str) -> Result<Option<Facility>> {
        self.facility_repo().get_by_name(name).await
    }

    pub async fn list_facilities(&self) -> Result<Vec<Facility>> {
        self.facility_repo().list_all().await
    }

    pub async fn delete_facility(&self, id: i32) -> Result<bool> {
        self.facility_repo().delete(id).await
    }

    pub async fn upsert_report(
        &self,
        facility_id: i32,
        icu_beds_available: i32,
        ventilators_available: i32,
        staff_on_duty: i32,
    ) -> Result<ResourceReport> {
        self.report_repo()
            .upsert(
                facility_id,
                icu_beds_available,
                ventilators_available,
                staff_on_duty,
            )
            .await
    }

    pub async fn latest_report(&self, facility_id: i32) -> Result<Option<ResourceReport>> {
        self.report_repo().latest_for_facility(facility_id).await
    }

    pub async fn latest_reports_by_facility(&self) -> Result<HashMap<i32, ResourceReport>> {
        self.report_repo().latest_by_facility().await
    }

    pub async fn reports_since(
        &self,
        facility_id: i32,
        cutoff: &str,
    ) -> Result<Vec<ResourceReport>> {
        self.report_repo()
            .for_facility_since(facility_id, cutoff)
            .await
    }
}
