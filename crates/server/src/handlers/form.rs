//! Request body helpers shared by the handlers

use axum::extract::{multipart::MultipartRejection, Multipart};
use std::collections::HashMap;

use crate::core::error::{Error, Result};
use crate::core::media::UploadedFile;

/// A fully read multipart body: text fields plus file parts
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(
        multipart: std::result::Result<Multipart, MultipartRejection>,
    ) -> Result<Self> {
        let mut multipart = multipart?;
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Non-blank text field, trimmed
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(|v| non_blank(Some(v.clone())))
    }

    /// Text field as sent, only rejected when empty
    pub fn raw(&self, name: &str) -> Option<String> {
        self.fields.get(name).filter(|v| !v.is_empty()).cloned()
    }

    /// Non-empty file part
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.data.is_empty())
    }
}

/// Trim and drop empty strings
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Required string field, or `MissingField` with the given message
pub fn required(value: Option<String>, message: &'static str) -> Result<String> {
    non_blank(value).ok_or(Error::MissingField(message))
}

/// Required secret; kept byte-for-byte, only rejected when empty
pub fn required_secret(value: Option<String>, message: &'static str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingField(message))
}
