//! Job seeker handlers

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::accounts::{login_from_request, register_from_form, LoginRequest};
use super::form::{required, MultipartForm};
use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use crate::core::models::{PrincipalKind, User};
use crate::core::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub job_id: Option<String>,
}

/// POST /user/register-user
pub async fn register(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    info!("POST /user/register-user");

    let (user, token) = register_from_form::<User>(&state, multipart, "Upload your image").await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "userData": user,
            "token": token,
        })),
    ))
}

/// POST /user/login-user
pub async fn login(
    State(state): State<AppState>,
    req: LoginRequest,
) -> Result<Json<Value>> {
    info!("POST /user/login-user");

    let (user, token) = login_from_request::<User>(&state, req).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "userData": user,
        "token": token,
    })))
}

/// GET /user/user-data
pub async fn user_data(ctx: Ctx<User>) -> Result<Json<Value>> {
    info!("GET /user/user-data - {}", ctx.principal().id);

    Ok(Json(json!({
        "success": true,
        "message": "User data fetched successfully",
        "userData": ctx.into_principal(),
    })))
}

/// POST /user/apply-job
pub async fn apply_job(
    State(state): State<AppState>,
    ctx: Ctx<User>,
    payload: std::result::Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(req) = payload?;
    let job_id = required(req.job_id, "Job ID is required")?;
    let user_id = &ctx.principal().id;
    info!("POST /user/apply-job - {} -> {}", user_id, job_id);

    let application = state.store.apply(user_id, &job_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Job applied successfully",
            "jobApplication": application,
        })),
    ))
}

/// POST /user/get-user-applications
pub async fn applications(State(state): State<AppState>, ctx: Ctx<User>) -> Result<Json<Value>> {
    let user_id = &ctx.principal().id;
    info!("POST /user/get-user-applications - {}", user_id);

    let applications = state.store.list_applications_for_user(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Job applications fetched successfully",
        "jobApplications": applications,
    })))
}

/// POST /user/upload-resume
pub async fn upload_resume(
    State(state): State<AppState>,
    ctx: Ctx<User>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let user_id = &ctx.principal().id;
    info!("POST /user/upload-resume - {}", user_id);

    let mut form = MultipartForm::read(multipart).await?;
    let resume = form
        .take_file("resume")
        .ok_or(Error::MissingField("Resume file is required"))?;

    let resume_url = state.media.upload(&resume).await?;

    let user = state
        .store
        .set_resume(user_id, &resume_url)
        .await?
        .ok_or(Error::PrincipalNotFound(PrincipalKind::User))?;

    Ok(Json(json!({
        "success": true,
        "message": "Resume uploaded successfully",
        "resumeUrl": user.resume,
    })))
}
