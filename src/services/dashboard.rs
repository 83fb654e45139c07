use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::upstream::{UpstreamClient, UpstreamError};
use crate::data::{Activity, DataError, Event, SchoolData, StudentSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentStats {
    pub total_students: usize,
    pub pending_assignments: u32,
    /// Unweighted mean of overall grades, one decimal place
    pub average_grade: f64,
    /// Unweighted mean of attendance rates, one decimal place
    pub attendance_rate: f64,
    pub unread_messages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDashboard {
    pub stats: ParentStats,
    pub students: Vec<StudentSummary>,
    pub recent_activities: Vec<Activity>,
    pub upcoming_events: Vec<Event>,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn compute_parent_stats(students: &[StudentSummary], unread_messages: u32) -> ParentStats {
    ParentStats {
        total_students: students.len(),
        pending_assignments: students.iter().map(|s| s.pending_assignments).sum(),
        average_grade: round_one_decimal(mean(students.iter().map(|s| s.overall_grade))),
        attendance_rate: round_one_decimal(mean(students.iter().map(|s| s.attendance_rate))),
        unread_messages,
    }
}

/// Compose the parent dashboard. Sources are read concurrently, and any
/// failure fails the whole payload.
pub async fn parent_dashboard(data: &dyn SchoolData, parent_id: &str) -> Result<ParentDashboard, DataError> {
    let (students, recent_activities, upcoming_events, unread_messages) = futures::try_join!(
        data.linked_students(parent_id),
        data.recent_activities(parent_id),
        data.upcoming_events(parent_id),
        data.unread_message_count(parent_id),
    )?;

    let stats = compute_parent_stats(&students, unread_messages);
    tracing::debug!(
        "Parent dashboard for '{}': {} students, {} activities, {} events",
        parent_id,
        stats.total_students,
        recent_activities.len(),
        upcoming_events.len()
    );

    Ok(ParentDashboard {
        stats,
        students,
        recent_activities,
        upcoming_events,
    })
}

/// The student dashboard is owned by the data API; pass it through
pub async fn student_dashboard(upstream: &UpstreamClient, email: &str) -> Result<Value, UpstreamError> {
    upstream.student_dashboard(email).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{StoredBadge, StoredXp};
    use async_trait::async_trait;
    use chrono::Utc;

    fn student(id: &str, grade: f64, attendance: f64, pending: u32) -> StudentSummary {
        StudentSummary {
            id: id.to_string(),
            name: format!("Student {}", id),
            grade: "Grade 5".to_string(),
            overall_grade: grade,
            attendance_rate: attendance,
            pending_assignments: pending,
            last_activity: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn averages_two_students() {
        let stats = compute_parent_stats(&[student("a", 88.0, 96.5, 3), student("b", 82.0, 93.5, 2)], 4);
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.average_grade, 85.0);
        assert_eq!(stats.attendance_rate, 95.0);
        assert_eq!(stats.pending_assignments, 5);
        assert_eq!(stats.unread_messages, 4);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let stats = compute_parent_stats(
            &[student("a", 90.0, 100.0, 0), student("b", 85.0, 90.0, 0), student("c", 81.0, 95.0, 0)],
            0,
        );
        // 256 / 3 = 85.333...
        assert_eq!(stats.average_grade, 85.3);
    }

    #[test]
    fn no_students_means_zero_averages() {
        let stats = compute_parent_stats(&[], 0);
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.average_grade, 0.0);
        assert_eq!(stats.attendance_rate, 0.0);
    }

    struct FailingEvents;

    #[async_trait]
    impl SchoolData for FailingEvents {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn linked_students(&self, _: &str) -> Result<Vec<StudentSummary>, DataError> {
            Ok(vec![student("a", 90.0, 90.0, 1)])
        }
        async fn recent_activities(&self, _: &str) -> Result<Vec<Activity>, DataError> {
            Ok(vec![])
        }
        async fn upcoming_events(&self, _: &str) -> Result<Vec<Event>, DataError> {
            Err(DataError::Unavailable("calendar offline".to_string()))
        }
        async fn unread_message_count(&self, _: &str) -> Result<u32, DataError> {
            Ok(0)
        }
        async fn student_xp(&self, _: &str) -> Result<StoredXp, DataError> {
            Err(DataError::NotFound("xp".to_string()))
        }
        async fn student_badges(&self, _: &str) -> Result<Vec<StoredBadge>, DataError> {
            Ok(vec![])
        }
        async fn health_check(&self) -> Result<(), DataError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn any_source_failure_fails_whole_payload() {
        let result = parent_dashboard(&FailingEvents, "parent-1").await;
        assert!(matches!(result, Err(DataError::Unavailable(_))));
    }

    #[tokio::test]
    async fn keeps_source_order() {
        let data = crate::data::fixture::FixtureData::new(crate::data::fixture::FixtureSet::load(None).unwrap());
        let dashboard = parent_dashboard(&data, "parent-1").await.unwrap();

        let ids: Vec<_> = dashboard.recent_activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["act-3", "act-2", "act-1"]);
        assert_eq!(dashboard.stats.total_students, dashboard.students.len());
    }
}
