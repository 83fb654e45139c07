use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use super::password::verify_password;
use super::Role;
use crate::data::fixture::FixtureUser;

/// Verified identity handed to the session issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Credential check delegated to whatever identity backend is wired in.
/// `Ok(None)` means "no match".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<Option<Identity>>;
}

/// No identity backend configured: nobody can sign in
pub struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn verify(&self, email: &str, _password: &str) -> anyhow::Result<Option<Identity>> {
        tracing::debug!("Sign-in for '{}' rejected: no identity provider configured", email);
        Ok(None)
    }
}

/// Demo accounts loaded from the fixture file
pub struct FixtureIdentity {
    users: Vec<FixtureUser>,
}

impl FixtureIdentity {
    pub fn new(users: Vec<FixtureUser>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentity {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<Option<Identity>> {
        let Some(user) = self
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email.trim()))
        else {
            return Ok(None);
        };

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| anyhow::anyhow!("stored hash for '{}' is unusable: {}", user.email, e))?;
        if !valid {
            return Ok(None);
        }

        Ok(Some(Identity {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;

    fn user() -> FixtureUser {
        FixtureUser {
            id: "parent-1".to_string(),
            email: "jordan.parent@example.com".to_string(),
            name: "Jordan Rivera".to_string(),
            role: Role::Parent,
            password_hash: hash_password("correct horse").unwrap(),
        }
    }

    #[tokio::test]
    async fn fixture_identity_matches_email_and_password() {
        let provider = FixtureIdentity::new(vec![user()]);

        let identity = provider
            .verify("Jordan.Parent@example.com", "correct horse")
            .await
            .unwrap()
            .expect("identity");
        assert_eq!(identity.role, Role::Parent);

        assert!(provider.verify("jordan.parent@example.com", "wrong").await.unwrap().is_none());
        assert!(provider.verify("nobody@example.com", "correct horse").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unusable_stored_hash_is_an_error() {
        let mut legacy = user();
        legacy.password_hash = "ec78b81d8d61b61e1e69e75a2b6b9c68".to_string();
        let provider = FixtureIdentity::new(vec![legacy]);

        assert!(provider.verify("jordan.parent@example.com", "correct horse").await.is_err());
    }

    #[tokio::test]
    async fn bundled_accounts_accept_demo_password() {
        let users = crate::data::fixture::FixtureSet::load(None).unwrap().users;
        let provider = FixtureIdentity::new(users);

        let identity = provider
            .verify("m.chen@example.com", "portal-demo")
            .await
            .unwrap()
            .expect("identity");
        assert_eq!(identity.role, Role::Teacher);
    }

    #[tokio::test]
    async fn no_identity_never_matches() {
        let result = NoIdentity.verify("jordan.parent@example.com", "correct horse").await.unwrap();
        assert!(result.is_none());
    }
}
