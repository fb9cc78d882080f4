use std::path::{Path, PathBuf};

use bytes::Bytes;
use sqlx::PgPool;
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::document::Document;
use crate::models::enums::DocumentType;

const DOCUMENT_COLUMNS: &str = "id, user_id, application_id, document_type, file_name, stored_path, \
    mime_type, size_bytes, created_at";

const ALLOWED_TYPES: [(&str, &str); 9] = [
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("rtf", "application/rtf"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub application_id: Option<Uuid>,
    pub document_type: DocumentType,
    pub file_name: String,
    pub data: Bytes,
}

/// Returns the normalized extension and MIME type for an upload, checking
/// the leading bytes of formats that have a reliable signature.
pub fn classify_upload(file_name: &str, data: &[u8]) -> Result<(String, &'static str)> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let Some((_, mime)) = ALLOWED_TYPES.iter().find(|(allowed, _)| *allowed == ext) else {
        return Err(Error::BadRequest(format!("File type .{} is not allowed", ext)));
    };

    let signature_ok = match ext.as_str() {
        "pdf" => data.starts_with(b"%PDF"),
        "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8]),
        _ => true,
    };
    if !signature_ok {
        return Err(Error::BadRequest(format!("Invalid .{} file content", ext)));
    }
    Ok((ext, *mime))
}

#[derive(Clone)]
pub struct DocumentService {
    pool: PgPool,
    uploads_dir: PathBuf,
    max_upload_bytes: usize,
}

impl DocumentService {
    pub fn new(pool: PgPool, uploads_dir: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            pool,
            uploads_dir: uploads_dir.into(),
            max_upload_bytes,
        }
    }

    pub async fn store(&self, user_id: Uuid, upload: DocumentUpload) -> Result<Document> {
        if upload.data.is_empty() {
            return Err(Error::invalid_field("file", "required", "file must not be empty"));
        }
        if upload.data.len() > self.max_upload_bytes {
            return Err(Error::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                self.max_upload_bytes
            )));
        }
        let (ext, mime) = classify_upload(&upload.file_name, &upload.data)?;

        if let Some(application_id) = upload.application_id {
            let owned: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM applications WHERE id = $1 AND user_id = $2")
                    .bind(application_id)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if owned.is_none() {
                return Err(Error::invalid_field(
                    "application_id",
                    "unknown_application",
                    "Application does not exist",
                ));
            }
        }

        fs::create_dir_all(&self.uploads_dir).await?;
        let stored_path = self.uploads_dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        let stored_path_str = stored_path.to_string_lossy().to_string();
        fs::write(&stored_path, &upload.data).await.map_err(|e| {
            tracing::error!(path = %stored_path_str, error = %e, "failed to write document");
            Error::Io(e)
        })?;

        let inserted = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents
                (user_id, application_id, document_type, file_name, stored_path, mime_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(upload.application_id)
        .bind(upload.document_type)
        .bind(&upload.file_name)
        .bind(&stored_path_str)
        .bind(mime)
        .bind(upload.data.len() as i64)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(document) => {
                tracing::info!(document_id = %document.id, %user_id, size = document.size_bytes, "document stored");
                Ok(document)
            }
            Err(e) => {
                remove_stored_file(&stored_path).await;
                Err(e.into())
            }
        }
    }

    pub async fn list(&self, user_id: Uuid, application_id: Option<Uuid>) -> Result<Vec<Document>> {
        let items = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {} FROM documents
            WHERE user_id = $1 AND ($2::uuid IS NULL OR application_id = $2)
            ORDER BY created_at DESC
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Document> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE id = $1 AND user_id = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("Document"))
    }

    pub async fn open(&self, user_id: Uuid, id: Uuid) -> Result<(Document, fs::File)> {
        let document = self.get(user_id, id).await?;
        let file = fs::File::open(&document.stored_path).await.map_err(|e| {
            tracing::warn!(document_id = %id, error = %e, "document file missing on disk");
            Error::not_found("Document file")
        })?;
        Ok((document, file))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let stored_path: Option<String> = sqlx::query_scalar(
            "DELETE FROM documents WHERE id = $1 AND user_id = $2 RETURNING stored_path",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let stored_path = stored_path.ok_or_else(|| Error::not_found("Document"))?;

        remove_stored_file(Path::new(&stored_path)).await;
        Ok(())
    }
}

/// Best-effort removal of a stored upload. Failures are logged and
/// reported as `false`; the database row is the source of truth.
pub async fn remove_stored_file(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove document file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_types_with_valid_signatures() {
        let (ext, mime) = classify_upload("Resume.PDF", b"%PDF-1.7 ...").unwrap();
        assert_eq!(ext, "pdf");
        assert_eq!(mime, "application/pdf");
        assert_eq!(classify_upload("notes.txt", b"hello").unwrap().1, "text/plain");
    }

    #[test]
    fn rejects_unknown_extensions_and_forged_content() {
        assert!(matches!(classify_upload("run.exe", b"MZ"), Err(Error::BadRequest(_))));
        assert!(matches!(classify_upload("no_extension", b"%PDF"), Err(Error::BadRequest(_))));
        assert!(matches!(classify_upload("photo.png", b"GIF89a"), Err(Error::BadRequest(_))));
    }

    #[tokio::test]
    async fn oversized_and_empty_uploads_are_rejected_before_io() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let dir = std::env::temp_dir().join(format!("jobtracker-docs-{}", Uuid::new_v4()));
        let service = DocumentService::new(pool, &dir, 4);

        let too_big = service
            .store(
                Uuid::new_v4(),
                DocumentUpload {
                    application_id: None,
                    document_type: DocumentType::Resume,
                    file_name: "cv.txt".into(),
                    data: Bytes::from_static(b"12345"),
                },
            )
            .await;
        assert!(matches!(too_big, Err(Error::PayloadTooLarge(_))));

        let empty = service
            .store(
                Uuid::new_v4(),
                DocumentUpload {
                    application_id: None,
                    document_type: DocumentType::Resume,
                    file_name: "cv.txt".into(),
                    data: Bytes::new(),
                },
            )
            .await;
        assert!(matches!(empty, Err(Error::Validation(_))));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn stored_file_removal_tolerates_missing_files() {
        let path = std::env::temp_dir().join(format!("jobtracker-doc-{}.txt", Uuid::new_v4()));
        fs::write(&path, b"resume").await.unwrap();

        assert!(remove_stored_file(&path).await);
        assert!(!path.exists());
        assert!(!remove_stored_file(&path).await);
    }
}
