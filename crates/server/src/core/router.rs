//! Core Router
//!
//! Route table for the user, company and public job APIs.

use crate::core::auth::middleware::{mw_require_company, mw_require_user};
use crate::core::media;
use crate::core::AppState;
use crate::handlers::{company, jobs, user};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    // route_layer only guards the routes registered before it
    let user_routes = Router::new()
        .route("/user-data", get(user::user_data))
        .route("/apply-job", post(user::apply_job))
        .route("/get-user-applications", post(user::applications))
        .route("/upload-resume", post(user::upload_resume))
        .route_layer(from_fn_with_state(state.clone(), mw_require_user))
        .route("/register-user", post(user::register))
        .route("/login-user", post(user::login));

    let company_routes = Router::new()
        .route("/company-data", get(company::company_data))
        .route("/post-job", post(company::post_job))
        .route("/company/posted-jobs", get(company::posted_jobs))
        .route("/change-visiblity", post(company::change_visibility))
        .route("/view-applications", post(company::view_applications))
        .route("/change-status", post(company::change_status))
        .route_layer(from_fn_with_state(state.clone(), mw_require_company))
        .route("/register-company", post(company::register))
        .route("/login-company", post(company::login));

    let job_routes = Router::new().route("/all-jobs", get(jobs::all_jobs));

    let body_limit = state.config.max_body_bytes();

    Router::new()
        .route("/", get(health_check))
        .nest("/user", user_routes)
        .nest("/company", company_routes)
        .nest("/job", job_routes)
        .route("/media/{name}", get(media::serve_media))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "api is working"
}
