use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::application_dto::{ApplicationFilter, MAX_PAGE};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationWithCompany};
use crate::models::enums::{ApplicationStatus, EmploymentType, Priority, WorkType};
use crate::models::status_history::StatusHistoryEntry;
use crate::services::document_service::remove_stored_file;
use crate::services::status_recorder;
use crate::utils::field_mapper::Vocabulary;
use crate::utils::validation::contains_pattern;

const APPLICATION_COLUMNS: &str = "id, user_id, company_id, position_title, status, priority, \
    employment_type, work_type, salary_min, salary_max, salary_currency, job_url, location, \
    source, notes, applied_on, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub company_id: Uuid,
    pub position_title: String,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub employment_type: EmploymentType,
    pub work_type: WorkType,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub salary_currency: Option<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub applied_on: Option<NaiveDate>,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ApplicationChanges {
    pub company_id: Option<Uuid>,
    pub position_title: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub priority: Option<Priority>,
    pub employment_type: Option<EmploymentType>,
    pub work_type: Option<WorkType>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub salary_currency: Option<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub applied_on: Option<NaiveDate>,
}

pub struct ApplicationDetail {
    pub application: ApplicationWithCompany,
    pub history: Vec<StatusHistoryEntry>,
}

pub struct ApplicationList {
    pub items: Vec<ApplicationWithCompany>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the application and its initial history entry atomically.
    pub async fn create(&self, user_id: Uuid, new: NewApplication) -> Result<ApplicationDetail> {
        check_salary_range(new.salary_min, new.salary_max)?;

        let mut tx = self.pool.begin().await?;
        let company_name = owned_company_name(&mut tx, user_id, new.company_id).await?;

        let query = format!(
            r#"
            INSERT INTO applications (
                user_id, company_id, position_title, status, priority, employment_type, work_type,
                salary_min, salary_max, salary_currency, job_url, location, source, notes, applied_on
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let application = sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .bind(new.company_id)
            .bind(&new.position_title)
            .bind(new.status)
            .bind(new.priority)
            .bind(new.employment_type)
            .bind(new.work_type)
            .bind(new.salary_min)
            .bind(new.salary_max)
            .bind(&new.salary_currency)
            .bind(&new.job_url)
            .bind(&new.location)
            .bind(&new.source)
            .bind(&new.notes)
            .bind(new.applied_on)
            .fetch_one(&mut *tx)
            .await?;

        let entry = status_recorder::append(
            &mut tx,
            application.id,
            &status_recorder::creation_entry(application.status),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            %user_id,
            status = ?application.status,
            "application created"
        );

        Ok(ApplicationDetail {
            application: ApplicationWithCompany {
                application,
                company_name,
            },
            history: vec![entry],
        })
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ApplicationDetail> {
        let mut conn = self.pool.acquire().await?;
        let application = fetch_with_company(&mut conn, user_id, id).await?;
        let history = status_recorder::list(&mut conn, id).await?;
        Ok(ApplicationDetail {
            application,
            history,
        })
    }

    pub async fn history(&self, user_id: Uuid, id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned(&mut conn, user_id, id).await?;
        status_recorder::list(&mut conn, id).await
    }

    /// Applies a partial update. The row is locked for the duration of the
    /// transaction so the recorded previous status is the value the row held
    /// right before this write.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ApplicationChanges,
    ) -> Result<ApplicationDetail> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1 AND user_id = $2 FOR UPDATE",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("Application"))?;

        if let Some(company_id) = changes.company_id {
            owned_company_name(&mut tx, user_id, company_id).await?;
        }
        check_salary_range(
            changes.salary_min.or(current.salary_min),
            changes.salary_max.or(current.salary_max),
        )?;

        let query = format!(
            r#"
            UPDATE applications
            SET
                company_id = COALESCE($3, company_id),
                position_title = COALESCE($4, position_title),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                employment_type = COALESCE($7, employment_type),
                work_type = COALESCE($8, work_type),
                salary_min = COALESCE($9, salary_min),
                salary_max = COALESCE($10, salary_max),
                salary_currency = COALESCE($11, salary_currency),
                job_url = COALESCE($12, job_url),
                location = COALESCE($13, location),
                source = COALESCE($14, source),
                notes = COALESCE($15, notes),
                applied_on = COALESCE($16, applied_on),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let updated = sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(user_id)
            .bind(changes.company_id)
            .bind(&changes.position_title)
            .bind(changes.status)
            .bind(changes.priority)
            .bind(changes.employment_type)
            .bind(changes.work_type)
            .bind(changes.salary_min)
            .bind(changes.salary_max)
            .bind(&changes.salary_currency)
            .bind(&changes.job_url)
            .bind(&changes.location)
            .bind(&changes.source)
            .bind(&changes.notes)
            .bind(changes.applied_on)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(entry) = status_recorder::transition_entry(current.status, changes.status) {
            status_recorder::append(&mut tx, id, &entry).await?;
            tracing::info!(
                application_id = %id,
                from = ?current.status,
                to = ?updated.status,
                "application status changed"
            );
        }

        let company_name = owned_company_name(&mut tx, user_id, updated.company_id).await?;
        let history = status_recorder::list(&mut tx, id).await?;
        tx.commit().await?;

        Ok(ApplicationDetail {
            application: ApplicationWithCompany {
                application: updated,
                company_name,
            },
            history,
        })
    }

    /// Deletes the application; history, interviews, tasks and documents
    /// go with it through `ON DELETE CASCADE`. Stored document files are
    /// removed once the transaction has committed.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        ensure_owned(&mut tx, user_id, id).await?;

        let stored_paths: Vec<String> =
            sqlx::query_scalar("SELECT stored_path FROM documents WHERE application_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        for path in stored_paths {
            remove_stored_file(Path::new(&path)).await;
        }
        tracing::info!(application_id = %id, %user_id, "application deleted");
        Ok(())
    }

    pub async fn list(&self, user_id: Uuid, filter: ApplicationFilter) -> Result<ApplicationList> {
        let page = filter.page.clamp(1, MAX_PAGE);
        let per_page = filter.per_page.clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);

        let mut filters = vec!["a.user_id = $1".to_string()];
        let mut args: Vec<String> = Vec::new();
        let next = |args: &Vec<String>| args.len() + 2;

        if let Some(status) = filter.status {
            filters.push(format!("a.status = ${}", next(&args)));
            args.push(status.storage().to_string());
        }
        if let Some(priority) = filter.priority {
            filters.push(format!("a.priority = ${}", next(&args)));
            args.push(priority.storage().to_string());
        }
        if let Some(company_id) = filter.company_id {
            filters.push(format!("a.company_id = ${}::uuid", next(&args)));
            args.push(company_id.to_string());
        }
        if let Some(search) = filter.search {
            let param = next(&args);
            filters.push(format!(
                r"(a.position_title ILIKE ${p} ESCAPE '\' OR c.name ILIKE ${p} ESCAPE '\')",
                p = param
            ));
            args.push(contains_pattern(&search));
        }

        let where_clause = format!("WHERE {}", filters.join(" AND "));

        let items_query = format!(
            "SELECT a.*, c.name AS company_name
             FROM applications a
             JOIN companies c ON c.id = a.company_id
             {}
             ORDER BY a.created_at DESC, a.id
             LIMIT ${} OFFSET ${}",
            where_clause,
            args.len() + 2,
            args.len() + 3
        );
        let total_query = format!(
            "SELECT COUNT(*) FROM applications a JOIN companies c ON c.id = a.company_id {}",
            where_clause
        );

        let mut items_statement = sqlx::query_as::<_, ApplicationWithCompany>(&items_query).bind(user_id);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        let items = items_statement
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query).bind(user_id);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        Ok(ApplicationList {
            items,
            total,
            page,
            per_page,
            total_pages: total.saturating_add(per_page - 1) / per_page,
        })
    }
}

/// Fails with NotFound when the application does not exist or belongs to
/// someone else; the two cases are indistinguishable to the caller.
pub async fn ensure_owned(conn: &mut PgConnection, user_id: Uuid, application_id: Uuid) -> Result<()> {
    let exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM applications WHERE id = $1 AND user_id = $2")
            .bind(application_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| Error::not_found("Application"))
}

async fn fetch_with_company(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<ApplicationWithCompany> {
    sqlx::query_as::<_, ApplicationWithCompany>(
        r#"
        SELECT a.*, c.name AS company_name
        FROM applications a
        JOIN companies c ON c.id = a.company_id
        WHERE a.id = $1 AND a.user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| Error::not_found("Application"))
}

/// A referenced company must belong to the caller. Anything else is a
/// validation failure on `company_id`, not a NotFound.
async fn owned_company_name(conn: &mut PgConnection, user_id: Uuid, company_id: Uuid) -> Result<String> {
    let name: Option<String> =
        sqlx::query_scalar("SELECT name FROM companies WHERE id = $1 AND user_id = $2")
            .bind(company_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    name.ok_or_else(|| {
        Error::invalid_field("company_id", "unknown_company", "Company does not exist")
    })
}

fn check_salary_range(min: Option<Decimal>, max: Option<Decimal>) -> Result<()> {
    if let Some(min) = min {
        if min.is_sign_negative() {
            return Err(Error::invalid_field("salary_min", "range", "salary_min must not be negative"));
        }
    }
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(Error::invalid_field(
            "salary_max",
            "range",
            "salary_max must be greater than or equal to salary_min",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_bounds_must_be_ordered() {
        assert!(check_salary_range(Some(Decimal::new(50_000, 0)), Some(Decimal::new(90_000, 0))).is_ok());
        assert!(check_salary_range(None, Some(Decimal::new(1, 0))).is_ok());
        assert!(check_salary_range(Some(Decimal::new(2, 0)), None).is_ok());
        assert!(matches!(
            check_salary_range(Some(Decimal::new(90_000, 0)), Some(Decimal::new(50_000, 0))),
            Err(Error::Validation(_))
        ));
        assert!(check_salary_range(Some(Decimal::new(-1, 0)), None).is_err());
    }
}
