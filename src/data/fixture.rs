use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Activity, DataError, Event, SchoolData, StoredBadge, StoredXp, StudentSummary};
use crate::auth::Role;

/// Fixture compiled into the binary, used when FIXTURE_PATH is unset
const BUNDLED_FIXTURE: &str = include_str!("../../fixtures/portal.yaml");

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Argon2 PHC string, as printed by `hash-password`
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentFixture {
    #[serde(default)]
    pub unread_messages: u32,
    #[serde(default)]
    pub students: Vec<StudentSummary>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFixture {
    pub xp: StoredXp,
    #[serde(default)]
    pub badges: Vec<StoredBadge>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSet {
    #[serde(default)]
    pub users: Vec<FixtureUser>,
    #[serde(default)]
    pub parents: HashMap<String, ParentFixture>,
    /// Keyed by student email
    #[serde(default)]
    pub students: HashMap<String, StudentFixture>,
}

impl FixtureSet {
    /// Load from `path`, or from the bundled fixture when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, FixtureError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::info!("Loaded fixture data from {}", path.display());
                Self::from_yaml(&raw)
            }
            None => Self::from_yaml(BUNDLED_FIXTURE),
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, FixtureError> {
        let mut set: FixtureSet = serde_yaml::from_str(raw)?;

        // Emails are matched case-insensitively
        set.students = set
            .students
            .into_iter()
            .map(|(email, student)| (email.to_ascii_lowercase(), student))
            .collect();

        Ok(set)
    }
}

/// In-memory backend serving the fixture set
pub struct FixtureData {
    set: FixtureSet,
}

impl FixtureData {
    pub fn new(set: FixtureSet) -> Self {
        Self { set }
    }

    fn parent(&self, parent_id: &str) -> Option<&ParentFixture> {
        self.set.parents.get(parent_id)
    }

    fn student(&self, email: &str) -> Result<&StudentFixture, DataError> {
        self.set
            .students
            .get(&email.trim().to_ascii_lowercase())
            .ok_or_else(|| DataError::NotFound(format!("No student record for '{}'", email)))
    }
}

#[async_trait]
impl SchoolData for FixtureData {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn linked_students(&self, parent_id: &str) -> Result<Vec<StudentSummary>, DataError> {
        Ok(self.parent(parent_id).map(|p| p.students.clone()).unwrap_or_default())
    }

    async fn recent_activities(&self, parent_id: &str) -> Result<Vec<Activity>, DataError> {
        Ok(self.parent(parent_id).map(|p| p.activities.clone()).unwrap_or_default())
    }

    async fn upcoming_events(&self, parent_id: &str) -> Result<Vec<Event>, DataError> {
        Ok(self.parent(parent_id).map(|p| p.events.clone()).unwrap_or_default())
    }

    async fn unread_message_count(&self, parent_id: &str) -> Result<u32, DataError> {
        Ok(self.parent(parent_id).map(|p| p.unread_messages).unwrap_or(0))
    }

    async fn student_xp(&self, email: &str) -> Result<StoredXp, DataError> {
        Ok(self.student(email)?.xp.clone())
    }

    async fn student_badges(&self, email: &str) -> Result<Vec<StoredBadge>, DataError> {
        Ok(self.student(email)?.badges.clone())
    }

    async fn health_check(&self) -> Result<(), DataError> {
        Ok(())
    }
}
