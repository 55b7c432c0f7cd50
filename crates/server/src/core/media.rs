//! Media Service Layer
//!
//! Profile images, company logos and resumes. The rest of the server only
//! sees the `MediaStore` trait: hand it a file, get back a public URL.

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::{Path as FsPath, PathBuf};
use tracing::{error, info};

use crate::core::AppState;

/// A file received in a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("uploaded file is empty")]
    Empty,
    #[error("media io: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote or local host for uploaded files
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist the file and return its durable public URL.
    async fn upload(&self, file: &UploadedFile) -> Result<String, MediaError>;
}

/// Content-addressed files on local disk, served back by `serve_media`
pub struct LocalMediaStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub async fn new(dir: impl AsRef<FsPath>, public_base_url: &str) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, file: &UploadedFile) -> Result<String, MediaError> {
        if file.data.is_empty() {
            return Err(MediaError::Empty);
        }

        let mut hasher = Sha256::new();
        hasher.update(&file.data);
        let name = format!("{:x}.{}", hasher.finalize(), extension_for(file));

        tokio::fs::write(self.dir.join(&name), &file.data).await?;
        info!("Stored media {} ({} bytes)", name, file.data.len());

        Ok(format!("{}/media/{}", self.public_base_url, name))
    }
}

fn extension_for(file: &UploadedFile) -> String {
    let from_name = file
        .file_name
        .as_deref()
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    match file.content_type.as_deref() {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("application/pdf") => "pdf",
        _ => "bin",
    }
    .to_string()
}

/// Scriptable types (svg, html) fall through to `application/octet-stream`.
fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Only `<hex>.<alnum>` names produced by `LocalMediaStore` are servable.
fn is_media_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && stem.chars().all(|c| c.is_ascii_hexdigit())
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

/// GET /media/{name}
pub async fn serve_media(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> std::result::Result<(HeaderMap, Bytes), StatusCode> {
    if !is_media_name(&name) {
        return Err(StatusCode::NOT_FOUND);
    }

    let data = match tokio::fs::read(state.config.media_dir.join(&name)).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to read media {}: {}", name, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok((media_headers(&name), Bytes::from(data)))
}

/// Uploads are user content served from the API origin, so nothing may run.
fn media_headers(name: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(name)),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; sandbox"),
    );
    headers
}
