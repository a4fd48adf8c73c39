use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use bson::oid::ObjectId;
use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Text fields and files of a request body. Accepts `multipart/form-data`
/// and, for text-only forms, a flat JSON object.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if let Some(filename) = field.file_name().map(|f| f.to_string()) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                form.files.insert(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let Json(body): Json<HashMap<String, serde_json::Value>> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let fields = body
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Null => None,
                other => Some((k, other.to_string())),
            })
            .collect();
        Ok(FormData {
            fields,
            files: HashMap::new(),
        })
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

/// Writes the file under `<upload_dir>/<folder>/<owner>/` and returns its storage key.
pub async fn store(
    upload_dir: &str,
    folder: &str,
    owner: ObjectId,
    file: &UploadedFile,
) -> Result<String, ApiError> {
    if file.bytes.is_empty() {
        return Err(ApiError::BadRequest(format!("{} file is empty", folder)));
    }
    let storage_key = format!(
        "{}/{}/{}-{}",
        folder,
        owner.to_hex(),
        uuid::Uuid::new_v4(),
        sanitize_filename(&file.filename)
    );
    let file_path = Path::new(upload_dir).join(&storage_key);

    if let Some(parent) = file_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create dirs: {}", e)))?;
    }
    tokio::fs::write(&file_path, &file.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to write file: {}", e)))?;

    Ok(storage_key)
}

/// Removes files stored for a request whose record was never written.
pub async fn discard(upload_dir: &str, storage_keys: &[String]) {
    for key in storage_keys {
        let Some(path) = resolve(upload_dir, key) else {
            continue;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(%key, error = %e, "Failed to remove orphaned upload");
        }
    }
}

/// Resolves a storage key to a path, refusing anything that escapes the upload dir.
pub fn resolve(upload_dir: &str, storage_key: &str) -> Option<PathBuf> {
    let key = Path::new(storage_key);
    if key
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(Path::new(upload_dir).join(key))
}

/// Owner segment of a storage key produced by [`store`].
pub fn owner_of(storage_key: &str) -> Option<ObjectId> {
    storage_key
        .split('/')
        .nth(1)
        .and_then(|s| ObjectId::parse_str(s).ok())
}
