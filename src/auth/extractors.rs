use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::error::AppError;

/// Raw token from an `Authorization: Bearer <token>` header.
///
/// Only extraction happens here; the identity service verifies the token.
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AppError::Unauthorized
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                AppError::Unauthorized
            })?;

        Ok(BearerToken(token.to_owned()))
    }
}
