use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    error::ApiError,
    extractors::auth::CurrentUser,
    state::AppState,
    uploads,
};

/// Serves an uploaded document to staff or to the user who uploaded it.
pub async fn download(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = uploads::owner_of(&key);
    if !user.is_admin() && (owner.is_none() || owner != user.id) {
        return Err(ApiError::Forbidden("You cannot access this file".to_string()));
    }
    let path = uploads::resolve(&state.settings.app.upload_dir, &key)
        .ok_or_else(|| ApiError::BadRequest("Invalid file key".to_string()))?;

    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound("File not found".to_string()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    ))
}
