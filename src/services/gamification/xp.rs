use serde::{Deserialize, Serialize};

use crate::data::StoredXp;

/// Percentage of the way from the current level to the next one.
///
/// Clamped to `[0, 100]`; XP past the threshold is not carried over. A zero
/// threshold means there is nothing left to earn at this level, so it reads
/// as complete.
pub fn xp_progress_percent(current_xp: u64, next_level_xp: u64) -> f64 {
    if next_level_xp == 0 {
        return 100.0;
    }
    let percent = current_xp as f64 / next_level_xp as f64 * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Label shown when the store has no rank for the student
pub fn rank_for_level(level: u32) -> &'static str {
    match level {
        0..=4 => "Novice",
        5..=9 => "Apprentice",
        10..=19 => "Scholar",
        20..=34 => "Expert",
        _ => "Master",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpRecord {
    pub current_xp: u64,
    pub total_xp: u64,
    pub level: u32,
    pub next_level_xp: u64,
    pub progress_percent: f64,
    pub rank: String,
    pub daily_streak: u32,
}

impl From<StoredXp> for XpRecord {
    fn from(stored: StoredXp) -> Self {
        let progress_percent = xp_progress_percent(stored.current_xp, stored.next_level_xp);
        let rank = stored
            .rank
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| rank_for_level(stored.level).to_string());

        Self {
            current_xp: stored.current_xp,
            total_xp: stored.total_xp,
            level: stored.level,
            next_level_xp: stored.next_level_xp,
            progress_percent,
            rank,
            daily_streak: stored.daily_streak,
        }
    }
}
