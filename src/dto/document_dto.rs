use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::document::Document;
use crate::models::enums::DocumentType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    pub application_id: Option<Uuid>,
    pub document_type: DocumentType,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentListQuery {
    pub application_id: Option<Uuid>,
}

impl From<Document> for DocumentResponse {
    fn from(value: Document) -> Self {
        Self {
            id: value.id,
            application_id: value.application_id,
            document_type: value.document_type,
            file_name: value.file_name,
            mime_type: value.mime_type,
            size_bytes: value.size_bytes,
            created_at: value.created_at,
        }
    }
}
