use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::StoredBadge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Academic,
    Participation,
    Mastery,
    Collaboration,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCategory::Academic => "academic",
            BadgeCategory::Participation => "participation",
            BadgeCategory::Mastery => "mastery",
            BadgeCategory::Collaboration => "collaboration",
        }
    }
}

impl fmt::Display for BadgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown badge category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for BadgeCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(BadgeCategory::Academic),
            "participation" => Ok(BadgeCategory::Participation),
            "mastery" => Ok(BadgeCategory::Mastery),
            "collaboration" => Ok(BadgeCategory::Collaboration),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Category filter used by the badge listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeFilter {
    #[default]
    All,
    Category(BadgeCategory),
}

impl BadgeFilter {
    pub fn matches(&self, category: BadgeCategory) -> bool {
        match self {
            BadgeFilter::All => true,
            BadgeFilter::Category(wanted) => *wanted == category,
        }
    }

    pub fn apply(&self, badges: Vec<Badge>) -> Vec<Badge> {
        badges.into_iter().filter(|b| self.matches(b.category)).collect()
    }
}

impl FromStr for BadgeFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(BadgeFilter::All);
        }
        s.parse().map(BadgeFilter::Category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeState {
    Locked,
    InProgress,
    Earned,
}

/// `min(100, count / threshold * 100)`; a zero threshold is always complete
pub fn badge_progress_percent(count: u32, threshold: u32) -> f64 {
    if threshold == 0 {
        return 100.0;
    }
    (count as f64 / threshold as f64 * 100.0).min(100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: BadgeCategory,
    pub state: BadgeState,
    pub earned: bool,
    pub progress_percent: f64,
    pub threshold: u32,
    pub current_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
}

impl Badge {
    fn locked(stored: &StoredBadge) -> Self {
        Self {
            id: stored.id.clone(),
            name: stored.name.clone(),
            description: stored.description.clone(),
            category: stored.category,
            state: BadgeState::Locked,
            earned: false,
            progress_percent: 0.0,
            threshold: stored.threshold,
            current_count: 0,
            earned_at: None,
        }
    }

    /// Move the badge forward for a new counter value observed at `changed_at`.
    ///
    /// Returns the new state when it changed. Earned is terminal, and the
    /// counter never moves backwards. Reaching Earned stamps `changed_at`,
    /// so the stamp is only as stable as the source's timestamp.
    pub fn advance(&mut self, count: u32, changed_at: Option<DateTime<Utc>>) -> Option<BadgeState> {
        if self.state == BadgeState::Earned {
            return None;
        }

        self.current_count = self.current_count.max(count);
        let previous = self.state;

        if self.current_count >= self.threshold {
            self.state = BadgeState::Earned;
            self.earned = true;
            self.progress_percent = 100.0;
            self.earned_at = changed_at;
        } else {
            self.progress_percent = badge_progress_percent(self.current_count, self.threshold);
            if self.progress_percent > 0.0 {
                self.state = BadgeState::InProgress;
            }
        }

        (self.state != previous).then_some(self.state)
    }
}

/// Result of evaluating a student's stored badge counters
#[derive(Debug, Clone)]
pub struct BadgeEvaluation {
    pub badges: Vec<Badge>,
    /// Badges that reached Earned during this evaluation
    pub newly_earned: Vec<Badge>,
}

/// Derive badge state from stored counters.
///
/// A badge the source already marks earned keeps its `earned_at`. One that
/// reaches its threshold here is stamped with the counter's `updated_at`,
/// or left unstamped when the source has none. The result depends only on
/// the stored records.
pub fn evaluate_badges(stored: Vec<StoredBadge>) -> BadgeEvaluation {
    let mut badges = Vec::with_capacity(stored.len());
    let mut newly_earned = Vec::new();

    for record in stored {
        let mut badge = Badge::locked(&record);

        match record.earned_at {
            Some(earned_at) => {
                badge.state = BadgeState::Earned;
                badge.earned = true;
                badge.progress_percent = 100.0;
                badge.current_count = record.current_count;
                badge.earned_at = Some(earned_at);
            }
            None => {
                if badge.advance(record.current_count, record.updated_at) == Some(BadgeState::Earned) {
                    newly_earned.push(badge.clone());
                }
            }
        }

        badges.push(badge);
    }

    BadgeEvaluation { badges, newly_earned }
}
