use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Application roles. Serialized names are the wire contract with the
/// frontend's stored user profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Solicitante,
    Comprador,
    Director,
    Admin,
}

impl Role {
    pub fn can_authorize(self) -> bool {
        matches!(self, Role::Director | Role::Admin)
    }

    pub fn can_purchase(self) -> bool {
        matches!(self, Role::Comprador | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// JWT claims. Token issuance lives in the identity provider; this backend
/// only validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub role: Role,
    pub area: String,
    pub exp: usize,
    pub iat: usize,
}

/// Decoding configuration shared through request extensions.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn decode(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

/// The acting user, as seen by the services layer.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub area: String,
}

impl Actor {
    pub fn require(&self, allowed: &[Role], action: &str) -> Result<(), ServiceError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role '{}' may not {}",
                self.role, action
            )))
        }
    }
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            role: claims.role,
            area: claims.area,
        }
    }
}

/// Extractor that validates the Bearer token on protected routes.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let config = parts
            .extensions
            .get::<Arc<AuthConfig>>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("auth config missing from request extensions".into())
            })?;

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("Expected Bearer token".into()))?;

        let claims = config.decode(token)?;
        Ok(AuthenticatedUser(claims.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(role: Role, secret: &str) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4(),
            name: "Test User".into(),
            role,
            area: "Sistemas".into(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_valid_token() {
        let config = AuthConfig::new("test-secret");
        let claims = config.decode(&token_for(Role::Director, "test-secret")).unwrap();
        assert_eq!(claims.role, Role::Director);
        assert_eq!(claims.area, "Sistemas");
    }

    #[test]
    fn rejects_wrong_secret() {
        let config = AuthConfig::new("test-secret");
        let err = config
            .decode(&token_for(Role::Director, "other-secret"))
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn role_gates() {
        assert!(Role::Director.can_authorize());
        assert!(Role::Admin.can_authorize());
        assert!(!Role::Comprador.can_authorize());
        assert!(Role::Comprador.can_purchase());
        assert!(!Role::Solicitante.can_purchase());
    }

    #[test]
    fn actor_require_maps_to_forbidden() {
        let actor = Actor {
            id: Uuid::new_v4(),
            name: "x".into(),
            role: Role::Solicitante,
            area: "Sistemas".into(),
        };
        let err = actor
            .require(&[Role::Director, Role::Admin], "authorize requests")
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
