use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::enums::InterviewType;
use crate::models::interview::{Interview, UpcomingInterview};
use crate::services::interview_service::{InterviewChanges, NewInterview};
use crate::utils::field_mapper::{resolve, resolve_change};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewPayload {
    pub interview_type: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 200))]
    pub interviewer: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInterviewPayload {
    pub interview_type: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 200))]
    pub interviewer: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
}

impl CreateInterviewPayload {
    pub fn into_new_interview(self) -> Result<NewInterview> {
        self.validate()?;
        let scheduled_at = self.scheduled_at.ok_or_else(|| {
            Error::invalid_field("scheduled_at", "required", "scheduled_at is required")
        })?;
        Ok(NewInterview {
            interview_type: resolve(self.interview_type.as_deref()),
            scheduled_at,
            duration_minutes: self.duration_minutes,
            interviewer: self.interviewer,
            location: self.location,
            notes: self.notes,
        })
    }
}

impl UpdateInterviewPayload {
    pub fn into_changes(self) -> Result<InterviewChanges> {
        self.validate()?;
        Ok(InterviewChanges {
            interview_type: resolve_change(self.interview_type.as_deref()),
            scheduled_at: self.scheduled_at,
            duration_minutes: self.duration_minutes,
            interviewer: self.interviewer,
            location: self.location,
            notes: self.notes,
            completed: self.completed,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub interview_type: InterviewType,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub interviewer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpcomingInterviewQuery {
    pub days: Option<i64>,
}

impl From<Interview> for InterviewResponse {
    fn from(value: Interview) -> Self {
        Self {
            id: value.id,
            application_id: value.application_id,
            interview_type: value.interview_type,
            scheduled_at: value.scheduled_at,
            duration_minutes: value.duration_minutes,
            interviewer: value.interviewer,
            location: value.location,
            notes: value.notes,
            completed: value.completed,
            position_title: None,
            company_name: None,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<UpcomingInterview> for InterviewResponse {
    fn from(value: UpcomingInterview) -> Self {
        Self {
            position_title: Some(value.position_title),
            company_name: Some(value.company_name),
            ..Self::from(value.interview)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_time_is_required() {
        let err = CreateInterviewPayload::default().into_new_interview().unwrap_err();
        assert!(matches!(err, Error::Validation(e) if e.field_errors().contains_key("scheduled_at")));
    }

    #[test]
    fn interview_type_accepts_form_spelling_and_defaults() {
        let new = CreateInterviewPayload {
            interview_type: Some("phone-screen".into()),
            scheduled_at: Some(Utc::now()),
            ..Default::default()
        }
        .into_new_interview()
        .unwrap();
        assert_eq!(new.interview_type, InterviewType::PhoneScreen);

        let defaulted = CreateInterviewPayload {
            scheduled_at: Some(Utc::now()),
            ..Default::default()
        }
        .into_new_interview()
        .unwrap();
        assert_eq!(defaulted.interview_type, InterviewType::Video);
    }

    #[test]
    fn duration_must_be_positive() {
        let result = CreateInterviewPayload {
            scheduled_at: Some(Utc::now()),
            duration_minutes: Some(0),
            ..Default::default()
        }
        .into_new_interview();
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
