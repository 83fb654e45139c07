// XP and badge calculations. Everything here is pure; handlers load the
// stored counters and pass them through.

pub mod badges;
pub mod xp;

pub use badges::{
    badge_progress_percent, evaluate_badges, Badge, BadgeCategory, BadgeEvaluation, BadgeFilter, BadgeState,
};
pub use xp::{rank_for_level, xp_progress_percent, XpRecord};
