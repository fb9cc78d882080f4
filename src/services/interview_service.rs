use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::enums::InterviewType;
use crate::models::interview::{Interview, UpcomingInterview};
use crate::services::application_service::ensure_owned;

const INTERVIEW_COLUMNS: &str = "i.id, i.application_id, i.interview_type, i.scheduled_at, \
    i.duration_minutes, i.interviewer, i.location, i.notes, i.completed, i.created_at, i.updated_at";

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub interview_type: InterviewType,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub interviewer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InterviewChanges {
    pub interview_type: Option<InterviewType>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub interviewer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
}

/// Interviews are reached only through an application the caller owns.
#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        new: NewInterview,
    ) -> Result<Interview> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned(&mut conn, user_id, application_id).await?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews AS i
                (application_id, interview_type, scheduled_at, duration_minutes, interviewer, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(application_id)
        .bind(new.interview_type)
        .bind(new.scheduled_at)
        .bind(new.duration_minutes)
        .bind(&new.interviewer)
        .bind(&new.location)
        .bind(&new.notes)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(interview_id = %interview.id, %application_id, "interview scheduled");
        Ok(interview)
    }

    pub async fn list_for_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<Vec<Interview>> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned(&mut conn, user_id, application_id).await?;

        let items = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews i WHERE i.application_id = $1 ORDER BY i.scheduled_at ASC",
            INTERVIEW_COLUMNS
        ))
        .bind(application_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(items)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {}
            FROM interviews i
            JOIN applications a ON a.id = i.application_id
            WHERE i.id = $1 AND a.user_id = $2
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("Interview"))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: InterviewChanges,
    ) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews AS i
            SET
                interview_type = COALESCE($3, i.interview_type),
                scheduled_at = COALESCE($4, i.scheduled_at),
                duration_minutes = COALESCE($5, i.duration_minutes),
                interviewer = COALESCE($6, i.interviewer),
                location = COALESCE($7, i.location),
                notes = COALESCE($8, i.notes),
                completed = COALESCE($9, i.completed),
                updated_at = NOW()
            FROM applications a
            WHERE i.id = $1 AND a.id = i.application_id AND a.user_id = $2
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(changes.interview_type)
        .bind(changes.scheduled_at)
        .bind(changes.duration_minutes)
        .bind(&changes.interviewer)
        .bind(&changes.location)
        .bind(&changes.notes)
        .bind(changes.completed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("Interview"))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query(
            r#"
            DELETE FROM interviews i
            USING applications a
            WHERE i.id = $1 AND a.id = i.application_id AND a.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("Interview"));
        }
        Ok(())
    }

    /// Open interviews scheduled between now and `days` from now.
    pub async fn upcoming(&self, user_id: Uuid, days: i64, limit: i64) -> Result<Vec<UpcomingInterview>> {
        let days = days.clamp(1, 90);
        let now = crate::utils::time::now();
        let until = now + Duration::days(days);

        let items = sqlx::query_as::<_, UpcomingInterview>(&format!(
            r#"
            SELECT {}, a.position_title, c.name AS company_name
            FROM interviews i
            JOIN applications a ON a.id = i.application_id
            JOIN companies c ON c.id = a.company_id
            WHERE a.user_id = $1 AND i.completed = FALSE
              AND i.scheduled_at >= $2 AND i.scheduled_at <= $3
            ORDER BY i.scheduled_at ASC
            LIMIT $4
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(now)
        .bind(until)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}
