use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tokio::task;

use super::InsertError;
use crate::config::SecurityConfig;
use crate::db::now_rfc3339;
use crate::entities::{prelude::*, users};
use crate::models::{User, UserRole};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_user(model: users::Model) -> Result<User> {
        let role = UserRole::parse(&model.role)
            .with_context(|| format!("Unknown role '{}' stored for user {}", model.role, model.id))?;

        Ok(User {
            id: model.id,
            email: model.email,
            role,
            facility_id: model.facility_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    /// Create a user with a hashed password. A duplicate email surfaces as
    /// `InsertError::Conflict` via the unique constraint.
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        facility_id: Option<i32>,
        security: &SecurityConfig,
    ) -> Result<User, InsertError> {
        let password = password.to_string();
        let config = security.clone();

        // Argon2 hashing is CPU-intensive; keep it off the async runtime.
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = now_rfc3339();
        let active = users::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            facility_id: Set(facility_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(InsertError::from_db)?;

        Ok(Self::map_user(model)?)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(Self::map_user).transpose()
    }

    /// Verify credentials. Returns `None` for an unknown email and for a
    /// wrong password alike; callers must not distinguish the two.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid {
            Ok(Some(Self::map_user(user)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        rows.into_iter().map(Self::map_user).collect()
    }

    pub async fn count_for_facility(&self, facility_id: i32) -> Result<u64> {
        let count = Users::find()
            .filter(users::Column::FacilityId.eq(facility_id))
            .count(&self.conn)
            .await
            .context("Failed to count users linked to facility")?;

        Ok(count)
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
