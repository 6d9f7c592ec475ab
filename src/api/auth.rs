//! Bearer-token authentication.
//!
//! Each profile gets an opaque token at signup. Handlers that take an
//! [`AuthUser`] argument reject requests whose token is missing or unknown.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use super::AppState;
use crate::db;
use crate::error::AppError;
use crate::models::Profile;

/// the authenticated caller's profile
#[derive(Debug, Clone)]
pub struct AuthUser(pub Profile);

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            tracing::warn!(event = "auth_failure", reason = "missing_authorization_header");
            return Err(AppError::Unauthorized);
        };

        let conn = state.db.lock().await;
        match db::get_profile_by_token(&conn, token)? {
            Some(profile) => Ok(AuthUser(profile)),
            None => {
                tracing::warn!(event = "auth_failure", reason = "unknown_token");
                Err(AppError::Unauthorized)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// fresh opaque api token
pub fn generate_token() -> String {
    format!("hq_{}", uuid::Uuid::new_v4().simple())
}
