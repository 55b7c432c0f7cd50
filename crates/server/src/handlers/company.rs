//! Company handlers

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
use super::form::{non_blank, required};
use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use crate::core::models::{ApplicationStatus, Company, NewJob};
use crate::core::AppState;

#[derive(Debug, Deserialize)]
pub struct PostJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub level: Option<String>,
    /// Number or numeric string
    pub salary: Option<Value>,
    pub category: Option<String>,
}

impl PostJobRequest {
    fn into_new_job(self) -> Result<NewJob> {
        const ALL_REQUIRED: &str = "All fields are required";

        let salary = parse_salary(self.salary, ALL_REQUIRED)?;

        Ok(NewJob {
            title: required(self.title, ALL_REQUIRED)?,
            description: required(self.description, ALL_REQUIRED)?,
            location: required(self.location, ALL_REQUIRED)?,
            level: required(self.level, ALL_REQUIRED)?,
            salary,
            category: required(self.category, ALL_REQUIRED)?,
        })
    }
}

/// A zero or blank salary counts as missing.
fn parse_salary(value: Option<Value>, missing: &'static str) -> Result<i64> {
    let salary = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().parse::<i64>().ok()),
        Some(Value::Number(n)) => Some(n.as_i64()),
        Some(_) => Some(None),
    };

    match salary {
        None | Some(Some(0)) => Err(Error::MissingField(missing)),
        Some(None) => Err(Error::BadRequest(
            "Salary must be a whole number".to_string(),
        )),
        Some(Some(s)) if s < 0 => Err(Error::BadRequest(
            "Salary must not be negative".to_string(),
        )),
        Some(Some(s)) => Ok(s),
    }
}

#[derive(Debug, Deserialize)]
pub struct JobIdRequest {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// POST /company/register-company
pub async fn register(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    info!("POST /company/register-company");

    let (company, token) =
        register_from_form::<Company>(&state, multipart, "Upload your logo").await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "companyData": company,
            "token": token,
        })),
    ))
}

/// POST /company/login-company
pub async fn login(
    State(state): State<AppState>,
    req: LoginRequest,
) -> Result<Json<Value>> {
    info!("POST /company/login-company");

    let (company, token) = login_from_request::<Company>(&state, req).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "companyData": company,
        "token": token,
    })))
}

/// GET /company/company-data
pub async fn company_data(ctx: Ctx<Company>) -> Result<Json<Value>> {
    info!("GET /company/company-data - {}", ctx.principal().id);

    Ok(Json(json!({
        "success": true,
        "message": "Company data fetched successfully",
        "companyData": ctx.into_principal(),
    })))
}

/// POST /company/post-job
pub async fn post_job(
    State(state): State<AppState>,
    ctx: Ctx<Company>,
    payload: std::result::Result<Json<PostJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let company_id = &ctx.principal().id;
    info!("POST /company/post-job - {}", company_id);

    let Json(req) = payload?;
    let job = state.store.post_job(company_id, req.into_new_job()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Job posted successfully",
            "job": job,
        })),
    ))
}

/// GET /company/company/posted-jobs
pub async fn posted_jobs(State(state): State<AppState>, ctx: Ctx<Company>) -> Result<Json<Value>> {
    let company_id = &ctx.principal().id;
    info!("GET /company/company/posted-jobs - {}", company_id);

    let jobs = state.store.list_jobs_for_company(company_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Jobs fetched successfully",
        "jobData": jobs,
    })))
}

/// POST /company/change-visiblity
pub async fn change_visibility(
    State(state): State<AppState>,
    ctx: Ctx<Company>,
    payload: std::result::Result<Json<JobIdRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let job_id = required(req.id, "Job ID is required")?;
    let company_id = &ctx.principal().id;
    info!("POST /company/change-visiblity - {} by {}", job_id, company_id);

    let job = state.store.toggle_visibility(&job_id, company_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Visibility changed",
        "job": job,
    })))
}

/// POST /company/view-applications
pub async fn view_applications(
    State(state): State<AppState>,
    ctx: Ctx<Company>,
) -> Result<Json<Value>> {
    let company_id = &ctx.principal().id;
    info!("POST /company/view-applications - {}", company_id);

    let applications = state.store.list_applicants_for_company(company_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Applicants fetched successfully",
        "viewApplicationData": applications,
    })))
}

/// POST /company/change-status
pub async fn change_status(
    State(state): State<AppState>,
    ctx: Ctx<Company>,
    payload: std::result::Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    const BOTH_REQUIRED: &str = "Application ID and status are required";

    let Json(req) = payload?;
    let application_id = required(req.id, BOTH_REQUIRED)?;
    let status: ApplicationStatus = non_blank(req.status)
        .ok_or(Error::MissingField(BOTH_REQUIRED))?
        .parse()?;

    let company_id = &ctx.principal().id;
    info!(
        "POST /company/change-status - {} -> {} by {}",
        application_id, status, company_id
    );

    let application = state
        .store
        .set_status(&application_id, company_id, status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Status changed successfully",
        "application": application,
    })))
}
