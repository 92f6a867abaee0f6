use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::UserRole;

pub mod revocation;

pub use revocation::RevocationSet;

/// Identity embedded in a token subject. A missing role never passes a role
/// guard, so a partially-parsed identity rejects the request rather than
/// defaulting to some role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIdentity {
    pub id: Option<i32>,
    pub role: Option<UserRole>,
    pub facility_id: Option<i32>,
}

impl TokenIdentity {
    #[must_use]
    pub const fn new(id: i32, role: UserRole, facility_id: Option<i32>) -> Self {
        Self {
            id: Some(id),
            role: Some(role),
            facility_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// JSON-serialized [`TokenIdentity`]; issued tokens carry the string
    /// form because the token format only supports simple subjects.
    pub sub: Value,
    /// Unique token id, checked against the revocation set on every request.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn identity(&self) -> TokenIdentity {
        subject_identity(&self.sub)
    }
}

/// Decode a token subject into an identity.
///
/// Tolerates a structured object (dev/test shortcut), the serialized-string
/// form used by issued tokens, and legacy scalar subjects carrying only a
/// user id. Anything malformed yields an empty identity, which no guard
/// accepts.
#[must_use]
pub fn subject_identity(sub: &Value) -> TokenIdentity {
    match sub {
        Value::Object(_) => serde_json::from_value(sub.clone()).unwrap_or_default(),
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| legacy_scalar(raw)),
        Value::Number(n) => TokenIdentity {
            id: n.as_i64().and_then(|v| i32::try_from(v).ok()),
            ..TokenIdentity::default()
        },
        _ => TokenIdentity::default(),
    }
}

fn legacy_scalar(raw: &str) -> TokenIdentity {
    raw.trim()
        .parse::<i32>()
        .map(|id| TokenIdentity {
            id: Some(id),
            ..TokenIdentity::default()
        })
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    MissingSecret,
    #[error("failed to encode token: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Decode(jsonwebtoken::errors::Error),
    #[error("failed to serialize token identity: {0}")]
    Subject(#[from] serde_json::Error),
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_hours: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        })
    }

    pub fn issue(&self, identity: &TokenIdentity) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: Value::String(serde_json::to_string(identity)?),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// Verify signature and expiry, returning the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(TokenError::Decode)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("unit-test-secret", 24).unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new("", 24),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let issuer = issuer();
        let identity = TokenIdentity::new(7, UserRole::Reporter, Some(3));

        let token = issuer.issue(&identity).unwrap();
        let claims = issuer.decode(&token).unwrap();

        assert_eq!(claims.identity(), identity);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn each_token_gets_a_unique_jti() {
        let issuer = issuer();
        let identity = TokenIdentity::new(1, UserRole::Admin, None);

        let a = issuer.decode(&issuer.issue(&identity).unwrap()).unwrap();
        let b = issuer.decode(&issuer.issue(&identity).unwrap()).unwrap();

        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn tampered_token_fails_decode() {
        let issuer = issuer();
        let token = issuer
            .issue(&TokenIdentity::new(1, UserRole::Admin, None))
            .unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        assert!(issuer.decode(&tampered).is_err());

        let other = TokenIssuer::new("another-secret", 24).unwrap();
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn expired_token_fails_decode() {
        let issuer = TokenIssuer::new("unit-test-secret", -2).unwrap();
        let token = issuer
            .issue(&TokenIdentity::new(1, UserRole::Admin, None))
            .unwrap();

        assert!(issuer.decode(&token).is_err());
    }

    #[test]
    fn structured_subject_is_accepted() {
        let sub = json!({"id": 5, "role": "monitor", "facility_id": null});
        assert_eq!(
            subject_identity(&sub),
            TokenIdentity::new(5, UserRole::Monitor, None)
        );
    }

    #[test]
    fn legacy_scalar_subject_keeps_id_but_no_role() {
        let identity = subject_identity(&json!("42"));
        assert_eq!(identity.id, Some(42));
        assert_eq!(identity.role, None);

        let identity = subject_identity(&json!(42));
        assert_eq!(identity.id, Some(42));
        assert_eq!(identity.role, None);
    }

    #[test]
    fn malformed_subject_yields_empty_identity() {
        assert_eq!(subject_identity(&json!("not json")), TokenIdentity::default());
        assert_eq!(
            subject_identity(&json!({"id": 1, "role": "banana"})),
            TokenIdentity::default()
        );
        assert_eq!(subject_identity(&json!(null)), TokenIdentity::default());
        assert_eq!(subject_identity(&json!([1, 2])), TokenIdentity::default());
    }
}
