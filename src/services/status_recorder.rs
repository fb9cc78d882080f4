//! Append-only audit trail of application status transitions.
//!
//! Callers decide *whether* a transition happened with the pure functions
//! below and then persist the entry on the same connection (transaction)
//! that writes the application row.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::enums::ApplicationStatus;
use crate::models::status_history::StatusHistoryEntry;
use crate::utils::field_mapper::Vocabulary;

pub const CREATED_NOTE: &str = "created";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub note: String,
}

/// The entry every application starts with.
pub fn creation_entry(initial: ApplicationStatus) -> NewHistoryEntry {
    NewHistoryEntry {
        previous_status: None,
        new_status: initial,
        note: CREATED_NOTE.to_string(),
    }
}

/// Returns the entry to append for an update, or `None` when the update
/// carries no status or the same status the application already has.
pub fn transition_entry(
    existing: ApplicationStatus,
    requested: Option<ApplicationStatus>,
) -> Option<NewHistoryEntry> {
    let requested = requested?;
    if requested == existing {
        return None;
    }
    Some(NewHistoryEntry {
        previous_status: Some(existing),
        new_status: requested,
        note: format!("Status updated to {}", requested.storage()),
    })
}

pub async fn append(
    conn: &mut PgConnection,
    application_id: Uuid,
    entry: &NewHistoryEntry,
) -> Result<StatusHistoryEntry> {
    let row = sqlx::query_as::<_, StatusHistoryEntry>(
        r#"
        INSERT INTO status_history (application_id, previous_status, new_status, note)
        VALUES ($1, $2, $3, $4)
        RETURNING id, application_id, previous_status, new_status, note, occurred_at
        "#,
    )
    .bind(application_id)
    .bind(entry.previous_status)
    .bind(entry.new_status)
    .bind(&entry.note)
    .fetch_one(conn)
    .await?;

    tracing::debug!(
        %application_id,
        previous = ?entry.previous_status,
        new = ?entry.new_status,
        "status history appended"
    );
    Ok(row)
}

/// Entries in insertion order. `id` comes from a sequence and is assigned
/// while the application row is locked, so it follows the transition chain.
pub async fn list(conn: &mut PgConnection, application_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
    let rows = sqlx::query_as::<_, StatusHistoryEntry>(
        r#"
        SELECT id, application_id, previous_status, new_status, note, occurred_at
        FROM status_history
        WHERE application_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(application_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_entry_has_no_previous_status() {
        let entry = creation_entry(ApplicationStatus::Applied);
        assert_eq!(entry.previous_status, None);
        assert_eq!(entry.new_status, ApplicationStatus::Applied);
        assert_eq!(entry.note, "created");
    }

    #[test]
    fn changed_status_records_prior_value() {
        let entry = transition_entry(
            ApplicationStatus::Applied,
            Some(ApplicationStatus::Interviewed),
        )
        .expect("status changed");
        assert_eq!(entry.previous_status, Some(ApplicationStatus::Applied));
        assert_eq!(entry.new_status, ApplicationStatus::Interviewed);
        assert_eq!(entry.note, "Status updated to interviewed");
    }

    #[test]
    fn note_uses_storage_spelling() {
        let entry = transition_entry(
            ApplicationStatus::Reviewing,
            Some(ApplicationStatus::InterviewScheduled),
        )
        .unwrap();
        assert_eq!(entry.note, "Status updated to interview_scheduled");
    }

    #[test]
    fn absent_or_unchanged_status_records_nothing() {
        assert_eq!(transition_entry(ApplicationStatus::Offer, None), None);
        assert_eq!(
            transition_entry(ApplicationStatus::Offer, Some(ApplicationStatus::Offer)),
            None
        );
    }

    #[test]
    fn scenario_create_then_repeat_update() {
        let mut history = vec![creation_entry(ApplicationStatus::default())];
        let mut current = ApplicationStatus::default();

        for requested in [ApplicationStatus::Interviewed, ApplicationStatus::Interviewed] {
            if let Some(entry) = transition_entry(current, Some(requested)) {
                current = entry.new_status;
                history.push(entry);
            }
        }

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].previous_status, None);
        assert_eq!(history[1].previous_status, Some(ApplicationStatus::Applied));
        assert_eq!(history[1].new_status, ApplicationStatus::Interviewed);
    }
}
