use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::application::ApplicationWithCompany;
use crate::models::enums::{ApplicationStatus, EmploymentType, Priority, WorkType};
use crate::models::status_history::StatusHistoryEntry;
use crate::services::application_service::{
    ApplicationChanges, ApplicationDetail, ApplicationList, NewApplication,
};
use crate::utils::field_mapper::{self, resolve, resolve_change};
use crate::utils::validation::{bounded_text, optional_bounded_text};

/// Checked after trimming, in characters.
const MAX_POSITION_TITLE_CHARS: usize = 200;
/// Keeps `(page - 1) * per_page` far from `i64` overflow.
pub const MAX_PAGE: i64 = 1_000_000;

/// Enum fields arrive as free text in either vocabulary and are mapped to
/// storage values before they reach the service layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
    pub company_id: Option<Uuid>,
    pub position_title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub employment_type: Option<String>,
    pub work_type: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(min = 3, max = 3))]
    pub salary_currency: Option<String>,
    #[validate(length(max = 2048))]
    pub job_url: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub source: Option<String>,
    pub notes: Option<String>,
    pub applied_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationPayload {
    pub company_id: Option<Uuid>,
    pub position_title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub employment_type: Option<String>,
    pub work_type: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(min = 3, max = 3))]
    pub salary_currency: Option<String>,
    #[validate(length(max = 2048))]
    pub job_url: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub source: Option<String>,
    pub notes: Option<String>,
    pub applied_on: Option<NaiveDate>,
}

impl CreateApplicationPayload {
    pub fn into_new_application(self) -> Result<NewApplication> {
        self.validate()?;
        let company_id = self
            .company_id
            .ok_or_else(|| Error::invalid_field("company_id", "required", "company_id is required"))?;
        let position_title = self.position_title.as_deref().ok_or_else(|| {
            Error::invalid_field("position_title", "required", "position_title is required")
        })?;

        Ok(NewApplication {
            company_id,
            position_title: bounded_text("position_title", position_title, MAX_POSITION_TITLE_CHARS)?,
            status: resolve(self.status.as_deref()),
            priority: resolve(self.priority.as_deref()),
            employment_type: resolve(self.employment_type.as_deref()),
            work_type: resolve(self.work_type.as_deref()),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            salary_currency: self.salary_currency.map(|c| c.to_ascii_uppercase()),
            job_url: self.job_url,
            location: self.location,
            source: self.source,
            notes: self.notes,
            applied_on: self.applied_on,
        })
    }
}

impl UpdateApplicationPayload {
    pub fn into_changes(self) -> Result<ApplicationChanges> {
        self.validate()?;
        Ok(ApplicationChanges {
            company_id: self.company_id,
            position_title: optional_bounded_text(
                "position_title",
                self.position_title.as_deref(),
                MAX_POSITION_TITLE_CHARS,
            )?,
            status: resolve_change(self.status.as_deref()),
            priority: resolve_change(self.priority.as_deref()),
            employment_type: resolve_change(self.employment_type.as_deref()),
            work_type: resolve_change(self.work_type.as_deref()),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            salary_currency: self.salary_currency.map(|c| c.to_ascii_uppercase()),
            job_url: self.job_url,
            location: self.location,
            source: self.source,
            notes: self.notes,
            applied_on: self.applied_on,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryResponse {
    pub id: i64,
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetailResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub history: Vec<StatusHistoryResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub company_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Typed filters; unlike writes, an unknown filter value is rejected.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub page: i64,
    pub per_page: i64,
    pub status: Option<ApplicationStatus>,
    pub priority: Option<Priority>,
    pub company_id: Option<Uuid>,
    pub search: Option<String>,
}

impl ApplicationListQuery {
    pub fn into_filter(self) -> Result<ApplicationFilter> {
        let status = match self.status.as_deref() {
            Some(raw) => Some(field_mapper::parse::<ApplicationStatus>(raw).ok_or_else(|| {
                Error::invalid_field("status", "unknown_value", format!("Unknown status: {}", raw))
            })?),
            None => None,
        };
        let priority = match self.priority.as_deref() {
            Some(raw) => Some(field_mapper::parse::<Priority>(raw).ok_or_else(|| {
                Error::invalid_field("priority", "unknown_value", format!("Unknown priority: {}", raw))
            })?),
            None => None,
        };
        Ok(ApplicationFilter {
            page: self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: self.per_page.unwrap_or(20).clamp(1, 100),
            status,
            priority,
            company_id: self.company_id,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

impl From<ApplicationWithCompany> for ApplicationResponse {
    fn from(value: ApplicationWithCompany) -> Self {
        let app = value.application;
        Self {
            id: app.id,
            company_id: app.company_id,
            company_name: value.company_name,
            position_title: app.position_title,
            status: app.status,
            priority: app.priority,
            employment_type: app.employment_type,
            work_type: app.work_type,
            salary_min: app.salary_min,
            salary_max: app.salary_max,
            salary_currency: app.salary_currency,
            job_url: app.job_url,
            location: app.location,
            source: app.source,
            notes: app.notes,
            applied_on: app.applied_on,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

impl From<StatusHistoryEntry> for StatusHistoryResponse {
    fn from(value: StatusHistoryEntry) -> Self {
        Self {
            id: value.id,
            previous_status: value.previous_status,
            new_status: value.new_status,
            note: value.note,
            occurred_at: value.occurred_at,
        }
    }
}

impl From<ApplicationDetail> for ApplicationDetailResponse {
    fn from(value: ApplicationDetail) -> Self {
        Self {
            application: value.application.into(),
            history: value.history.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ApplicationList> for ApplicationListResponse {
    fn from(value: ApplicationList) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
        }
    }
}
