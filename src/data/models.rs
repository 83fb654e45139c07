use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::gamification::BadgeCategory;

/// Read-only summary of a student linked to a parent account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub overall_grade: f64,
    pub attendance_rate: f64,
    pub pending_assignments: u32,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// XP counters as kept by the backing store. Progress is derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredXp {
    pub current_xp: u64,
    pub total_xp: u64,
    pub level: u32,
    pub next_level_xp: u64,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub daily_streak: u32,
}

/// Badge definition plus the student's counter toward it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBadge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: BadgeCategory,
    pub threshold: u32,
    #[serde(default)]
    pub current_count: u32,
    #[serde(default)]
    pub earned_at: Option<DateTime<Utc>>,
    /// When the source last changed `current_count`
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
