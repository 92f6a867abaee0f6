use serde::Serialize;

use crate::entities::facilities;

/// A healthcare site whose resource availability is tracked.
#[derive(Debug, Clone, Serialize)]
pub struct Facility {
    pub id: i32,
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub created_at: String,
}

impl From<facilities::Model> for Facility {
    fn from(model: facilities::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            country: model.country,
            city: model.city,
            created_at: model.created_at,
        }
    }
}
