use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::utils::field_mapper::vocabulary_table;

/// Publishes the storage/presentation mapping for every mapped field.
/// Reads always return storage values; clients translate with this table.
#[utoipa::path(
    get,
    path = "/api/vocabulary",
    responses(
        (status = 200, description = "Field vocabulary table")
    )
)]
#[axum::debug_handler]
pub async fn get_vocabulary() -> impl IntoResponse {
    Json(json!({ "fields": vocabulary_table() }))
}
