//! Bearer-token authentication.
//!
//! Callers authenticate with `Authorization: Bearer <jwt>` (HS256). The token
//! claims carry the account id and role:
//!
//! ```json
//! { "sub": "user-42", "role": "admin", "exp": 1767225600 }
//! ```
//!
//! Two extractors turn the header into an [`Actor`]:
//! - [`Authenticated`]: the header is required; missing or invalid → 401
//! - [`MaybeAuthenticated`]: the header is optional; present but invalid → 401
//!
//! [`ApiJson`] and [`ApiQuery`] wrap axum's body and query extractors so that
//! decode failures use the same `{code, message}` body as every other error.
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     Authenticated(actor): Authenticated,
//! ) -> Result<Json<Settings>, AppError> {
//!     tracing::info!(user_id = %actor.user_id, "Processing request");
//!     Ok(Json(state.settings.get().await?))
//! }
//! ```

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use fieldbook_core::{Actor, Role, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims understood by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account identifier.
    pub sub: String,
    /// Granted role.
    pub role: Role,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

impl Claims {
    /// Claims for `actor`, valid for `ttl` from now.
    #[must_use]
    pub fn for_actor(actor: &Actor, ttl: chrono::Duration) -> Self {
        let exp = (chrono::Utc::now() + ttl).timestamp();
        Self {
            sub: actor.user_id.0.clone(),
            role: actor.role,
            exp: u64::try_from(exp).unwrap_or(0),
        }
    }
}

/// Signs and verifies bearer tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenVerifier {
    /// Create a verifier for `secret`.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
        }
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::internal("Failed to sign token").with_source(e.into()))
    }

    /// Verify a compact token and return its actor.
    ///
    /// # Errors
    ///
    /// Returns 401 if the signature, expiry or claims are invalid.
    pub fn verify(&self, token: &str) -> Result<Actor, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::unauthorized("Invalid or expired token")
        })?;

        Ok(Actor {
            user_id: UserId(data.claims.sub),
            role: data.claims.role,
        })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::unauthorized("Malformed Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| AppError::unauthorized("Expected a Bearer token"))
}

/// An authenticated caller. Rejects the request with 401 when absent.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
        state.tokens.verify(token).map(Self)
    }
}

/// A caller that may or may not be signed in.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Actor>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => state.tokens.verify(token).map(|actor| Self(Some(actor))),
            None => Ok(Self(None)),
        }
    }
}

/// JSON request body whose decode failures answer with [`AppError`] (422).
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose decode failures answer with [`AppError`] (422).
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            user_id: UserId("user-1".to_string()),
            role,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let verifier = TokenVerifier::new(b"secret");
        let token = verifier
            .sign(&Claims::for_actor(&actor(Role::Owner), chrono::Duration::hours(1)))
            .unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), actor(Role::Owner));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenVerifier::new(b"secret")
            .sign(&Claims::for_actor(&actor(Role::Admin), chrono::Duration::hours(1)))
            .unwrap();
        let err = TokenVerifier::new(b"other").verify(&token).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = TokenVerifier::new(b"secret");
        let token = verifier
            .sign(&Claims::for_actor(&actor(Role::Admin), chrono::Duration::hours(-2)))
            .unwrap();
        assert!(verifier.verify(&token).is_err());
    }
}
