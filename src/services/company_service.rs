use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::company_dto::{CreateCompanyPayload, UpdateCompanyPayload};
use crate::error::{Error, Result};
use crate::models::company::{Company, CompanyWithCount};
use crate::utils::validation::{contains_pattern, optional_required_text, required_text};

const COMPANY_COLUMNS: &str =
    "id, user_id, name, website, industry, location, notes, created_at, updated_at";

#[derive(Clone)]
pub struct CompanyService {
    pool: PgPool,
}

impl CompanyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateCompanyPayload) -> Result<Company> {
        let name = required_text("name", &payload.name)?;
        self.ensure_name_free(user_id, &name, None).await?;

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (user_id, name, website, industry, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(user_id)
        .bind(&name)
        .bind(&payload.website)
        .bind(&payload.industry)
        .bind(&payload.location)
        .bind(&payload.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, &name))?;

        tracing::info!(company_id = %company.id, %user_id, "company created");
        Ok(company)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Company> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1 AND user_id = $2",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("Company"))
    }

    pub async fn list(&self, user_id: Uuid, search: Option<String>) -> Result<Vec<CompanyWithCount>> {
        let pattern = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| contains_pattern(&s));

        let items = sqlx::query_as::<_, CompanyWithCount>(
            r#"
            SELECT c.*, COUNT(a.id) AS application_count
            FROM companies c
            LEFT JOIN applications a ON a.company_id = c.id
            WHERE c.user_id = $1 AND ($2::text IS NULL OR c.name ILIKE $2 ESCAPE '\')
            GROUP BY c.id
            ORDER BY LOWER(c.name) ASC
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: UpdateCompanyPayload,
    ) -> Result<Company> {
        self.get(user_id, id).await?;
        let name = optional_required_text("name", payload.name.as_deref())?;
        if let Some(name) = &name {
            self.ensure_name_free(user_id, name, Some(id)).await?;
        }

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET
                name = COALESCE($3, name),
                website = COALESCE($4, website),
                industry = COALESCE($5, industry),
                location = COALESCE($6, location),
                notes = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(&name)
        .bind(&payload.website)
        .bind(&payload.industry)
        .bind(&payload.location)
        .bind(&payload.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, name.as_deref().unwrap_or_default()))?;

        Ok(company)
    }

    /// Removes the company together with its applications.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM companies WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("Company"));
        }
        tracing::info!(company_id = %id, %user_id, "company deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, user_id: Uuid, name: &str, except: Option<Uuid>) -> Result<()> {
        let existing: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM companies
            WHERE user_id = $1 AND LOWER(name) = LOWER($2) AND ($3::uuid IS NULL OR id <> $3)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(except)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Err(conflict(name));
        }
        Ok(())
    }
}

fn conflict(name: &str) -> Error {
    Error::Conflict(format!("A company named \"{}\" already exists", name))
}

/// The unique index still guards against two concurrent inserts racing
/// past `ensure_name_free`.
fn duplicate_name(err: sqlx::Error, name: &str) -> Error {
    match Error::from(err) {
        Error::Conflict(_) => conflict(name),
        other => other,
    }
}
