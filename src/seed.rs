//! Sample-data seeding for local development. Safe to run repeatedly;
//! existing rows are left alone.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::models::UserRole;

const SAMPLE_FACILITIES: [(&str, &str, &str); 5] = [
    ("City General Hospital", "USA", "New York"),
    ("St. Mary's Medical Center", "USA", "Los Angeles"),
    ("Royal Victoria Hospital", "UK", "London"),
    ("Toronto General Hospital", "Canada", "Toronto"),
    ("Sydney Medical Center", "Australia", "Sydney"),
];

pub async fn seed_sample_data(store: &Store, security: &SecurityConfig) -> Result<()> {
    let mut created = 0;
    for (name, country, city) in SAMPLE_FACILITIES {
        if store.get_facility_by_name(name).await?.is_some() {
            info!("Facility already exists: {name}");
            continue;
        }

        store.create_facility(name, Some(country), Some(city)).await?;
        created += 1;
        info!("Created facility: {name}");
    }

    if created > 0 {
        info!("Created {created} facilities");
    } else {
        info!("No new facilities created");
    }

    // Reporter accounts for the first two facilities plus one monitor.
    let reporters = [
        ("reporter1@example.com", "reporter123", SAMPLE_FACILITIES[0].0),
        ("reporter2@example.com", "reporter123", SAMPLE_FACILITIES[1].0),
    ];

    for (email, password, facility_name) in reporters {
        if store.get_user_by_email(email).await?.is_some() {
            info!("User already exists: {email}");
            continue;
        }

        let Some(facility) = store.get_facility_by_name(facility_name).await? else {
            warn!("Facility '{facility_name}' missing; skipping seed user {email}");
            continue;
        };

        store
            .create_user(email, password, UserRole::Reporter, Some(facility.id), security)
            .await?;
        info!("Created reporter {email} for {facility_name}");
    }

    let monitor_email = "monitor1@example.com";
    if store.get_user_by_email(monitor_email).await?.is_none() {
        store
            .create_user(monitor_email, "monitor123", UserRole::Monitor, None, security)
            .await?;
        info!("Created monitor {monitor_email}");
    } else {
        info!("User already exists: {monitor_email}");
    }

    Ok(())
}
