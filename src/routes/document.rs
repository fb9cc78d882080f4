use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{
    dto::document_dto::{DocumentListQuery, DocumentResponse},
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::enums::DocumentType,
    services::document_service::DocumentUpload,
    AppState,
};

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        tracing::warn!(error = %err, "malformed multipart upload");
        Error::BadRequest(err.body_text())
    }
}

/// Quotes are dropped so the name can sit inside a quoted header value.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

#[utoipa::path(
    post,
    path = "/api/documents",
    responses(
        (status = 201, description = "Document stored", body = Json<DocumentResponse>),
        (status = 400, description = "Missing or unsupported file"),
        (status = 413, description = "File too large")
    )
)]
#[axum::debug_handler]
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut application_id = None;
    let mut document_type = DocumentType::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "applicationId" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = Uuid::parse_str(raw).map_err(|_| {
                        Error::invalid_field(
                            "application_id",
                            "invalid_uuid",
                            "applicationId must be a UUID",
                        )
                    })?;
                    application_id = Some(id);
                }
            }
            "documentType" => {
                let raw = field.text().await.map_err(multipart_error)?;
                document_type = DocumentType::parse(&raw).unwrap_or_else(|| {
                    tracing::warn!(value = %raw, "unknown document type, storing as other");
                    DocumentType::default()
                });
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, data));
            }
            other => {
                tracing::debug!(field = %other, "ignoring unknown multipart field");
            }
        }
    }

    let (file_name, data) = file
        .ok_or_else(|| Error::invalid_field("file", "required", "A file part is required"))?;

    let document = state
        .document_service
        .store(
            user.id,
            DocumentUpload {
                application_id,
                document_type,
                file_name,
                data,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

#[utoipa::path(
    get,
    path = "/api/documents",
    params(
        ("applicationId" = Option<Uuid>, Query, description = "Only documents of this application")
    ),
    responses(
        (status = 200, description = "Documents", body = Json<Vec<DocumentResponse>>)
    )
)]
#[axum::debug_handler]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse> {
    let items = state
        .document_service
        .list(user.id, query.application_id)
        .await?;
    let items: Vec<DocumentResponse> = items.into_iter().map(DocumentResponse::from).collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document metadata", body = Json<DocumentResponse>),
        (status = 404, description = "Document not found")
    )
)]
#[axum::debug_handler]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let document = state.document_service.get(user.id, id).await?;
    Ok(Json(DocumentResponse::from(document)))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}/download",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "Document not found")
    )
)]
#[axum::debug_handler]
pub async fn download_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let (document, file) = state.document_service.open(user.id, id).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, document.mime_type.as_str())
        .header(header::CONTENT_LENGTH, document.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&document.file_name),
        )
        .body(body)
        .map_err(|e| Error::Internal(format!("Failed to build download response: {}", e)))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.document_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_strips_quotes_and_control_chars() {
        assert_eq!(
            attachment_disposition("my \"cv\"\n.pdf"),
            "attachment; filename=\"my cv.pdf\""
        );
    }
}
