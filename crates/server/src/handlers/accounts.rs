//! Registration and login shared by the user and company routes

use axum::extract::{multipart::MultipartRejection, FromRequest, Multipart, Request};
use axum::http::header;
use axum::Json;
use serde::Deserialize;

use super::form::{required, required_secret, MultipartForm};
use crate::core::error::{Error, Result};
use crate::core::models::Principal;
use crate::core::AppState;

/// Login credentials, sent as JSON or as a multipart form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl<S> FromRequest<S> for LoginRequest
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let form = MultipartForm::read(Multipart::from_request(req, state).await).await?;
            return Ok(Self {
                email: form.text("email"),
                password: form.raw("password"),
            });
        }

        let Json(req) = Json::<Self>::from_request(req, state).await?;
        Ok(req)
    }
}

/// Multipart registration: `name`, `email`, `password` and an `image` file.
pub async fn register_from_form<P: Principal>(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
    image_message: &'static str,
) -> Result<(P, String)> {
    let mut form = MultipartForm::read(multipart).await?;

    let name = required(form.text("name"), "Enter your name")?;
    let email = required(form.text("email"), "Enter your email")?;
    let password = required_secret(form.raw("password"), "Enter your password")?;
    let image = form
        .take_file("image")
        .ok_or(Error::MissingField(image_message))?;

    let accounts = state.accounts();
    // Checked before the upload so a duplicate never reaches the media host.
    accounts.ensure_available::<P>(&email).await?;

    let image_url = state.media.upload(&image).await?;

    accounts.register::<P>(name, email, &password, image_url).await
}

pub async fn login_from_request<P: Principal>(
    state: &AppState,
    req: LoginRequest,
) -> Result<(P, String)> {
    let email = required(req.email, "Email is required")?;
    let password = required_secret(req.password, "Password is required")?;

    state.accounts().login::<P>(&email, &password).await
}
