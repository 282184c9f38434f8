use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::{Actor, AppError};

use super::jwt::Claims;

/// Extractor that requires authentication. Returns 401 if no valid token
/// or if the token names a role the service does not know.
pub struct AuthRequired(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for AuthRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        claims
            .actor()
            .map(AuthRequired)
            .ok_or_else(|| AppError::unauthorized(format!("Unknown role '{}'", claims.role)))
    }
}
