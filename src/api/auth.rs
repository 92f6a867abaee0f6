use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::info;

use super::types::{MessageResponse, RegisterResponse, TokenGrant};
use super::validation::{
    sanitize_email, sanitize_integer, sanitize_string, validate_login_payload,
    validate_user_payload,
};
use super::{ApiError, AppState};
use crate::auth::TokenIdentity;
use crate::db::InsertError;
use crate::models::UserRole;

// ============================================================================
// Guards
// ============================================================================

/// Verified token context injected into guarded requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: TokenIdentity,
    pub jti: String,
}

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, &[UserRole::Admin]).await
}

/// Admins keep oversight access to reporter endpoints.
pub async fn require_reporter(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, &[UserRole::Reporter, UserRole::Admin]).await
}

/// Admins keep oversight access to monitor endpoints.
pub async fn require_monitor(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, &[UserRole::Monitor, UserRole::Admin]).await
}

/// Authentication without a role requirement (logout).
pub async fn require_authenticated(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = verify_request(&state, request.headers())?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

async fn authorize(
    state: &AppState,
    mut request: Request,
    next: Next,
    allowed: &[UserRole],
) -> Result<Response, ApiError> {
    let ctx = verify_request(state, request.headers())?;

    match ctx.identity.role {
        Some(role) if allowed.contains(&role) => {
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        // The response never reveals which roles would have been accepted.
        _ => Err(ApiError::forbidden()),
    }
}

fn verify_request(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let token = bearer_token(headers).ok_or_else(ApiError::auth_failed)?;

    let claims = state
        .tokens()
        .decode(&token)
        .map_err(|_| ApiError::auth_failed())?;

    // Revoked tokens are indistinguishable from invalid ones.
    if state.revoked().contains(&claims.jti) {
        return Err(ApiError::auth_failed());
    }

    Ok(AuthContext {
        identity: claims.identity(),
        jti: claims.jti,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
/// Create an account and return a token carrying the embedded identity.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let errors = validate_user_payload(&data, true);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let email = sanitize_email(data.get("email"));
    let password = data
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let role_value = {
        let raw = sanitize_string(data.get("role"), 50).to_lowercase();
        if raw.is_empty() {
            UserRole::Reporter.as_str().to_string()
        } else {
            raw
        }
    };

    let facility_id = sanitize_integer(data.get("facility_id"), Some(1), None)
        .and_then(|v| i32::try_from(v).ok());
    if !data.get("facility_id").is_none_or(Value::is_null) && facility_id.is_none() {
        return Err(ApiError::bad_request(
            "facility_id must be a positive integer.",
        ));
    }

    let Some(role) = UserRole::parse(&role_value) else {
        return Err(ApiError::bad_request("Invalid role."));
    };

    if role != UserRole::Reporter && facility_id.is_some() {
        return Err(ApiError::bad_request(
            "facility_id allowed only for reporter role.",
        ));
    }
    if role == UserRole::Reporter && facility_id.is_none() {
        return Err(ApiError::bad_request(
            "facility_id is required for reporter role.",
        ));
    }

    if let Some(id) = facility_id
        && state.store().get_facility(id).await?.is_none()
    {
        return Err(ApiError::not_found("Facility not found."));
    }

    let user = state
        .store()
        .create_user(&email, password, role, facility_id, state.security())
        .await
        .map_err(|e| match e {
            InsertError::Conflict => ApiError::conflict("Email already registered."),
            other => other.into(),
        })?;

    info!("Registered {} account for {}", user.role, user.email);

    let identity = TokenIdentity::new(user.id, user.role, user.facility_id);
    let access_token = state
        .tokens()
        .issue(&identity)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            access_token,
            role: user.role,
            facility_id: user.facility_id,
            user,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(data): Json<Value>,
) -> Result<Json<TokenGrant>, ApiError> {
    let errors = validate_login_payload(&data);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let email = sanitize_email(data.get("email"));
    let password = data
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // One generic failure for unknown email and wrong password alike.
    let user = state
        .store()
        .authenticate_user(&email, password)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    let identity = TokenIdentity::new(user.id, user.role, user.facility_id);
    let access_token = state
        .tokens()
        .issue(&identity)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(TokenGrant {
        access_token,
        role: user.role,
        facility_id: user.facility_id,
    }))
}

/// POST /api/auth/logout
/// Revoke the presented token for the rest of the process lifetime.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<MessageResponse> {
    state.revoked().revoke(&ctx.jti);

    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}
