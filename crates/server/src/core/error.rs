use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::core::auth::TokenError;
use crate::core::media::MediaError;
use crate::core::models::{PrincipalKind, UnknownStatus};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Validation
    #[error("{0}")]
    MissingField(&'static str),
    #[error("{0}")]
    BadRequest(String),

    // Auth Errors
    #[error("Invalid email or password")]
    LoginFail,
    #[error("Unauthorized, login again")]
    AuthFailNoToken,
    #[error("Unauthorized, login again")]
    AuthFailInvalidToken,
    #[error("Session expired, login again")]
    AuthFailExpiredToken,
    #[error("Unauthorized, login again")]
    AuthFailWrongKind,
    #[error("auth context missing")]
    AuthFailCtxNotInRequestExt,
    #[error("{0}")]
    Forbidden(&'static str),

    // Model Errors
    #[error("{} not found", title_case(.0))]
    PrincipalNotFound(PrincipalKind),
    #[error("Job not found")]
    JobNotFound,
    #[error("Job application not found")]
    ApplicationNotFound,
    #[error("{} already exists", title_case(.0))]
    DuplicateIdentity(PrincipalKind),
    #[error("You have already applied for this job")]
    AlreadyApplied,

    // Upstream
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

fn title_case(kind: &PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::User => "User",
        PrincipalKind::Company => "Company",
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::LoginFail
            | Error::AuthFailNoToken
            | Error::AuthFailInvalidToken
            | Error::AuthFailExpiredToken
            | Error::AuthFailWrongKind => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::PrincipalNotFound(_) | Error::JobNotFound | Error::ApplicationNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DuplicateIdentity(_) | Error::AlreadyApplied => StatusCode::CONFLICT,
            Error::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            Error::AuthFailCtxNotInRequestExt | Error::Store(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to clients. Server-side failures get a generic text.
    fn client_message(&self) -> String {
        match self {
            Error::UploadFailed(_) => "Upload failed".to_string(),
            Error::AuthFailCtxNotInRequestExt | Error::Store(_) | Error::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{:?}", self);
        }

        let body = Json(json!({
            "success": false,
            "message": self.client_message(),
        }));

        (status, body).into_response()
    }
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Error::AuthFailExpiredToken,
            TokenError::Invalid => Error::AuthFailInvalidToken,
            TokenError::Encode(e) => Error::Internal(format!("token encoding failed: {}", e)),
        }
    }
}

impl From<MediaError> for Error {
    fn from(err: MediaError) -> Self {
        Error::UploadFailed(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Internal(format!("password hashing failed: {}", err))
    }
}

impl From<UnknownStatus> for Error {
    fn from(err: UnknownStatus) -> Self {
        Error::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Error::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}
