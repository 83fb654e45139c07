use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};

use super::{Activity, DataError, Event, SchoolData, StoredBadge, StoredXp, StudentSummary};
use crate::services::gamification::BadgeCategory;

/// Backend reading straight from the portal Postgres schema (see sql/schema.sql)
pub struct PgData {
    pool: PgPool,
}

impl PgData {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DataError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!("Created database pool ({} connections max)", max_connections);
        Ok(Self { pool })
    }
}

fn non_negative(value: i32) -> u32 {
    value.max(0) as u32
}

fn non_negative_64(value: i64) -> u64 {
    value.max(0) as u64
}

/// `COUNT(*)` is BIGINT; saturate into the `u32` the dashboard reports
fn count_to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

fn parse_category(raw: &str) -> Result<BadgeCategory, DataError> {
    raw.parse::<BadgeCategory>()
        .map_err(|e| DataError::Decode(e.to_string()))
}

fn student_from_row(row: &PgRow) -> Result<StudentSummary, sqlx::Error> {
    Ok(StudentSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        grade: row.try_get("grade")?,
        overall_grade: row.try_get("overall_grade")?,
        attendance_rate: row.try_get("attendance_rate")?,
        pending_assignments: non_negative(row.try_get("pending_assignments")?),
        last_activity: row.try_get("last_activity")?,
        is_active: row.try_get("is_active")?,
    })
}

fn badge_from_row(row: &PgRow) -> Result<StoredBadge, DataError> {
    let category: String = row.try_get("category")?;
    let category = parse_category(&category)?;

    Ok(StoredBadge {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category,
        threshold: non_negative(row.try_get("threshold")?),
        current_count: non_negative(row.try_get("current_count")?),
        earned_at: row.try_get("earned_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl SchoolData for PgData {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn linked_students(&self, parent_id: &str) -> Result<Vec<StudentSummary>, DataError> {
        let query = r#"
            SELECT id, name, grade, overall_grade, attendance_rate,
                   pending_assignments, last_activity, is_active
            FROM students
            WHERE parent_id = $1
            ORDER BY name
        "#;

        let rows = sqlx::query(query).bind(parent_id).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| student_from_row(row).map_err(DataError::from))
            .collect()
    }

    async fn recent_activities(&self, parent_id: &str) -> Result<Vec<Activity>, DataError> {
        let query = r#"
            SELECT a.id, a.student_id, a.kind, a.title, a.description, a.occurred_at
            FROM activities a
            JOIN students s ON s.id = a.student_id
            WHERE s.parent_id = $1
            ORDER BY a.occurred_at DESC
            LIMIT 20
        "#;

        let rows = sqlx::query(query).bind(parent_id).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<Activity, DataError> {
                Ok(Activity {
                    id: row.try_get("id")?,
                    student_id: row.try_get("student_id")?,
                    kind: row.try_get("kind")?,
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    timestamp: row.try_get("occurred_at")?,
                })
            })
            .collect()
    }

    async fn upcoming_events(&self, _parent_id: &str) -> Result<Vec<Event>, DataError> {
        // School-wide calendar; not scoped to a family
        let query = r#"
            SELECT id, title, starts_at, location, category
            FROM events
            WHERE starts_at >= now()
            ORDER BY starts_at ASC
            LIMIT 10
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<Event, DataError> {
                Ok(Event {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    date: row.try_get("starts_at")?,
                    location: row.try_get("location")?,
                    category: row.try_get("category")?,
                })
            })
            .collect()
    }

    async fn unread_message_count(&self, parent_id: &str) -> Result<u32, DataError> {
        let query = "SELECT COUNT(*) AS unread FROM messages WHERE recipient_id = $1 AND read_at IS NULL";

        let row = sqlx::query(query).bind(parent_id).fetch_one(&self.pool).await?;
        let unread: i64 = row.try_get("unread")?;
        Ok(count_to_u32(unread))
    }

    async fn student_xp(&self, email: &str) -> Result<StoredXp, DataError> {
        let query = r#"
            SELECT current_xp, total_xp, level, next_level_xp, rank, daily_streak
            FROM student_xp
            WHERE lower(email) = lower($1)
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("No XP record for '{}'", email)))?;

        Ok(StoredXp {
            current_xp: non_negative_64(row.try_get("current_xp")?),
            total_xp: non_negative_64(row.try_get("total_xp")?),
            level: non_negative(row.try_get("level")?),
            next_level_xp: non_negative_64(row.try_get("next_level_xp")?),
            rank: row.try_get("rank")?,
            daily_streak: non_negative(row.try_get("daily_streak")?),
        })
    }

    async fn student_badges(&self, email: &str) -> Result<Vec<StoredBadge>, DataError> {
        let query = r#"
            SELECT b.id, b.name, b.description, b.category, b.threshold,
                   COALESCE(p.current_count, 0) AS current_count, p.earned_at, p.updated_at
            FROM badges b
            LEFT JOIN student_badges p
                   ON p.badge_id = b.id AND lower(p.email) = lower($1)
            ORDER BY b.category, b.name
        "#;

        let rows = sqlx::query(query).bind(email).fetch_all(&self.pool).await?;
        rows.iter().map(badge_from_row).collect()
    }

    async fn health_check(&self) -> Result<(), DataError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
