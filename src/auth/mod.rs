use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{SecurityConfig, MAX_SESSION_EXPIRY_HOURS};

pub mod cookies;
pub mod guard;
pub mod identity;
pub mod password;
pub mod role;

pub use guard::{require_role, require_session, Access, RejectReason};
pub use identity::{Identity, IdentityProvider};
pub use role::Role;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "portal_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(identity: &Identity, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours.min(MAX_SESSION_EXPIRY_HOURS) as i64)).timestamp();

        Self {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Decoded session exposed to handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    InvalidSecret,

    #[error("Token generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// A freshly issued session token
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub session: Session,
}

/// Signs and validates stateless session tokens
#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
    expiry_hours: u64,
}

impl SessionKeys {
    /// Expiry is capped at `MAX_SESSION_EXPIRY_HOURS`
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours: expiry_hours.min(MAX_SESSION_EXPIRY_HOURS),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.session_secret.clone(), security.session_expiry_hours)
    }

    pub fn expiry_hours(&self) -> u64 {
        self.expiry_hours
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, SessionError> {
        let claims = Claims::new(identity, self.expiry_hours);
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| SessionError::TokenGeneration("expiry out of range".to_string()))?;

        let token = self.encode(&claims)?;

        Ok(IssuedToken {
            token,
            expires_at,
            session: Session::from(claims),
        })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), claims, &encoding_key)
            .map_err(|e| SessionError::TokenGeneration(e.to_string()))
    }

    /// Check signature and expiry, returning the session the token carries
    pub fn validate(&self, token: &str) -> Result<Session, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| SessionError::Invalid(e.to_string()))?;

        Ok(Session::from(token_data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: "user-1".to_string(),
            email: "casey@example.com".to_string(),
            name: "Casey".to_string(),
            role,
        }
    }

    #[test]
    fn issued_token_round_trips_to_session() {
        let keys = SessionKeys::new("test-secret", 1);
        let issued = keys.issue(&identity(Role::Parent)).unwrap();

        let session = keys.validate(&issued.token).unwrap();
        assert_eq!(session, issued.session);
        assert_eq!(session.role, Role::Parent);
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn oversized_expiry_is_capped_not_a_panic() {
        let keys = SessionKeys::new("test-secret", u64::MAX);
        assert_eq!(keys.expiry_hours(), MAX_SESSION_EXPIRY_HOURS);

        let issued = keys.issue(&identity(Role::Admin)).unwrap();
        let year = chrono::Duration::hours(MAX_SESSION_EXPIRY_HOURS as i64);
        assert!(issued.expires_at <= Utc::now() + year);
        assert!(keys.validate(&issued.token).is_ok());

        let claims = Claims::new(&identity(Role::Admin), u64::MAX);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = SessionKeys::new("secret-a", 1).issue(&identity(Role::Student)).unwrap();
        let err = SessionKeys::new("secret-b", 1).validate(&issued.token).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new("test-secret", 1);
        let mut claims = Claims::new(&identity(Role::Student), 1);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 60;

        let token = keys.encode(&claims).unwrap();
        assert!(matches!(keys.validate(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let keys = SessionKeys::new("", 1);
        assert!(matches!(keys.issue(&identity(Role::Admin)), Err(SessionError::InvalidSecret)));
    }

    #[test]
    fn unknown_role_claim_does_not_decode() {
        let keys = SessionKeys::new("test-secret", 1);
        let claims = serde_json::json!({
            "sub": "user-1",
            "email": "casey@example.com",
            "name": "Casey",
            "role": "SUPERUSER",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 600,
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        assert!(keys.validate(&token).is_err());
    }
}
