pub mod dashboard;
pub mod gamification;
pub mod upstream;

pub use dashboard::{compute_parent_stats, parent_dashboard, student_dashboard, ParentDashboard, ParentStats};
pub use upstream::{UpstreamClient, UpstreamError};
