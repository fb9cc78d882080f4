use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::task_dto::{CreateTaskPayload, UpdateTaskPayload};
use crate::error::{Error, Result};
use crate::models::task::Task;
use crate::services::application_service::ensure_owned;
use crate::utils::validation::{optional_required_text, required_text};

const TASK_COLUMNS: &str =
    "t.id, t.application_id, t.title, t.due_on, t.completed, t.created_at, t.updated_at";

#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        payload: CreateTaskPayload,
    ) -> Result<Task> {
        let title = required_text("title", &payload.title)?;
        let mut conn = self.pool.acquire().await?;
        ensure_owned(&mut conn, user_id, application_id).await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks AS t (application_id, title, due_on)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(application_id)
        .bind(&title)
        .bind(payload.due_on)
        .fetch_one(&mut *conn)
        .await?;
        Ok(task)
    }

    pub async fn list_for_application(&self, user_id: Uuid, application_id: Uuid) -> Result<Vec<Task>> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned(&mut conn, user_id, application_id).await?;

        let items = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {} FROM tasks t
            WHERE t.application_id = $1
            ORDER BY t.completed ASC, t.due_on ASC NULLS LAST, t.created_at ASC
            "#,
            TASK_COLUMNS
        ))
        .bind(application_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(items)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, payload: UpdateTaskPayload) -> Result<Task> {
        let title = optional_required_text("title", payload.title.as_deref())?;
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks AS t
            SET
                title = COALESCE($3, t.title),
                due_on = COALESCE($4, t.due_on),
                completed = COALESCE($5, t.completed),
                updated_at = NOW()
            FROM applications a
            WHERE t.id = $1 AND a.id = t.application_id AND a.user_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(&title)
        .bind(payload.due_on)
        .bind(payload.completed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("Task"))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query(
            r#"
            DELETE FROM tasks t
            USING applications a
            WHERE t.id = $1 AND a.id = t.application_id AND a.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("Task"));
        }
        Ok(())
    }
}
