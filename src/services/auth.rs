//! Authentication service implementation
//!
//! Verifies bearer tokens issued by the campus wall account service and
//! answers the role questions the event endpoints need: who may create
//! events, and who may manage an event's registrations.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::models::Event;
use crate::utils::errors::{CampusWallError, Result};

/// Role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Organizer,
    Admin,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_create_events(&self) -> bool {
        matches!(self.role, Role::Organizer | Role::Admin)
    }

    /// Admins manage every event, organizers only their own
    pub fn can_manage_event(&self, event: &Event) -> bool {
        self.is_admin() || event.organizer_id == self.user_id
    }

    pub fn require_event_manager(&self, event: &Event) -> Result<()> {
        if self.can_manage_event(event) {
            Ok(())
        } else {
            warn!(user_id = self.user_id, event_id = event.id, "Unauthorized event management attempt");
            Err(CampusWallError::PermissionDenied(
                "Only the organizer or an admin can manage this event".to_string()
            ))
        }
    }
}

/// Authentication service for token handling and access control
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    admin_ids: HashSet<i64>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            token_ttl: Duration::hours(config.token_ttl_hours),
            admin_ids: config.admin_ids.iter().copied().collect(),
        }
    }

    /// Check if user is a configured admin
    pub fn is_configured_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Issue a signed token for `user_id`
    pub fn issue_token(&self, user_id: i64, role: Role) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify a bearer token and build the caller context
    pub fn verify_token(&self, token: &str) -> Result<AuthContext> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let user_id: i64 = data.claims.sub.parse().map_err(|_| {
            CampusWallError::Authentication("Token subject is not a user id".to_string())
        })?;

        let role = if self.is_configured_admin(user_id) {
            Role::Admin
        } else {
            data.claims.role
        };

        debug!(user_id = user_id, role = ?role, "Token verified");
        Ok(AuthContext { user_id, role })
    }

    /// Extract and verify the token of an `Authorization: Bearer ...` header value
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<AuthContext> {
        let header = header.ok_or_else(|| {
            CampusWallError::Authentication("Missing Authorization header".to_string())
        })?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                CampusWallError::Authentication("Authorization header must use the Bearer scheme".to_string())
            })?;

        self.verify_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use assert_matches::assert_matches;

    fn service(admin_ids: Vec<i64>) -> AuthService {
        let mut settings = Settings::default();
        settings.auth.admin_ids = admin_ids;
        AuthService::new(&settings.auth)
    }

    #[test]
    fn test_token_round_trip_keeps_identity() {
        let auth = service(vec![]);
        let token = auth.issue_token(42, Role::Organizer).unwrap();
        let ctx = auth.verify_token(&token).unwrap();
        assert_eq!(ctx, AuthContext { user_id: 42, role: Role::Organizer });
    }

    #[test]
    fn test_configured_admin_is_elevated() {
        let auth = service(vec![7]);
        let token = auth.issue_token(7, Role::User).unwrap();
        assert!(auth.verify_token(&token).unwrap().is_admin());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let auth = service(vec![]);
        let mut other_settings = Settings::default();
        other_settings.auth.jwt_secret = "a-completely-different-secret".to_string();
        let other = AuthService::new(&other_settings.auth);

        let token = other.issue_token(1, Role::Admin).unwrap();
        assert_matches!(auth.verify_token(&token), Err(CampusWallError::Jwt(_)));
    }

    #[test]
    fn test_authenticate_header() {
        let auth = service(vec![]);
        let token = auth.issue_token(5, Role::User).unwrap();

        assert!(auth.authenticate_header(Some(&format!("Bearer {}", token))).is_ok());
        assert_matches!(auth.authenticate_header(None), Err(CampusWallError::Authentication(_)));
        assert_matches!(
            auth.authenticate_header(Some(&format!("Basic {}", token))),
            Err(CampusWallError::Authentication(_))
        );
        assert_matches!(auth.authenticate_header(Some("Bearer ")), Err(CampusWallError::Authentication(_)));
    }

    #[test]
    fn test_role_capabilities() {
        let user = AuthContext { user_id: 1, role: Role::User };
        let organizer = AuthContext { user_id: 2, role: Role::Organizer };
        let admin = AuthContext { user_id: 3, role: Role::Admin };

        assert!(!user.can_create_events());
        assert!(organizer.can_create_events());
        assert!(admin.can_create_events());
        assert!(admin.is_admin());
        assert!(!organizer.is_admin());
    }
}
