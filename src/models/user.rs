use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of account roles. Guard sites match on this exhaustively, so
/// an unknown role can never slip through a membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Reporter,
    Monitor,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reporter => "reporter",
            Self::Monitor => "monitor",
        }
    }

    /// Parse a sanitized, lowercased role string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "reporter" => Some(Self::Reporter),
            "monitor" => Some(Self::Monitor),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User data returned from the store (never carries the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub role: UserRole,
    pub facility_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_round_trips() {
        for role in [UserRole::Admin, UserRole::Reporter, UserRole::Monitor] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("superuser"), None);
        assert_eq!(UserRole::parse(""), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(UserRole::Reporter).unwrap(),
            serde_json::json!("reporter")
        );
    }
}
