use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use portal_server::core::auth::TokenService;
use portal_server::core::media::{MediaError, MediaStore, UploadedFile};
use portal_server::core::models::PrincipalKind;
use portal_server::core::{AppState, PortalConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";
const BOUNDARY: &str = "portal-test-boundary";

struct Harness {
    _dir: TempDir,
    state: AppState,
    app: Router,
}

async fn setup() -> Harness {
    let dir = TempDir::new().unwrap();
    let config = PortalConfig::with_base_dir(dir.path(), SECRET);
    let state = AppState::new(config).await.unwrap();
    let app = portal_server::app(state.clone());
    Harness {
        _dir: dir,
        state,
        app,
    }
}

fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

fn multipart_request(uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    builder.body(body).unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register_user(app: &Router, name: &str, email: &str) -> (StatusCode, Value) {
    let body = multipart(
        &[("name", name), ("email", email), ("password", "pa55word")],
        &[("image", "me.png", &b"fake-png"[..])],
    );
    send(app, multipart_request("/user/register-user", None, body)).await
}

async fn register_company(app: &Router, name: &str, email: &str) -> (StatusCode, Value) {
    let body = multipart(
        &[("name", name), ("email", email), ("password", "pa55word")],
        &[("image", "logo.png", &b"fake-logo"[..])],
    );
    send(app, multipart_request("/company/register-company", None, body)).await
}

fn token_of(body: &Value) -> String {
    body["token"].as_str().unwrap().to_string()
}

async fn post_job(app: &Router, token: &str, title: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/company/post-job",
            Some(token),
            Some(json!({
                "title": title,
                "description": "Build services in Rust",
                "location": "Remote",
                "level": "Senior",
                "salary": 150000,
                "category": "Engineering",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["job"].clone()
}

#[tokio::test]
async fn test_health_check() {
    let h = setup().await;
    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_duplicate_conflicts() {
    let h = setup().await;

    let (status, body) = register_user(&h.app, "A", "a@x.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["userData"]["email"], "a@x.com");
    assert!(body["userData"]["image"].as_str().unwrap().contains("/media/"));
    assert!(body["userData"].get("passwordHash").is_none());
    assert!(!token_of(&body).is_empty());

    let (status, body) = register_user(&h.app, "A again", "a@x.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists");

    let count = h.state.store.count_principals(PrincipalKind::User).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_register_requires_image() {
    let h = setup().await;

    let body = multipart(
        &[("name", "NoLogo"), ("email", "hr@nologo.com"), ("password", "pw")],
        &[],
    );
    let (status, body) = send(&h.app, multipart_request("/company/register-company", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Upload your logo");

    let body = multipart(&[("email", "a@x.com"), ("password", "pw")], &[]);
    let (status, body) = send(&h.app, multipart_request("/user/register-user", None, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Enter your name");
}

#[tokio::test]
async fn test_login() {
    let h = setup().await;
    register_company(&h.app, "Acme", "hr@acme.com").await;

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/company/login-company",
            None,
            Some(json!({ "email": "hr@acme.com", "password": "pa55word" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyData"]["name"], "Acme");
    let token = token_of(&body);

    let (status, body) = send(
        &h.app,
        json_request(Method::GET, "/company/company-data", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyData"]["email"], "hr@acme.com");

    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            "/company/login-company",
            None,
            Some(json!({ "email": "hr@acme.com", "password": "wrong" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/company/login-company",
            None,
            Some(json!({ "password": "pa55word" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is required");

    // A company account is not a user account
    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            "/user/login-user",
            None,
            Some(json!({ "email": "hr@acme.com", "password": "pa55word" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let h = setup().await;
    let (_, body) = register_user(&h.app, "A", "a@x.com").await;
    let user_token = token_of(&body);
    let user_id = body["userData"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&h.app, json_request(Method::GET, "/user/user-data", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let expired = TokenService::new(SECRET.as_bytes(), Duration::days(-1))
        .issue(PrincipalKind::User, &user_id)
        .unwrap();
    let (status, _) = send(
        &h.app,
        json_request(Method::GET, "/user/user-data", Some(&expired), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = TokenService::new(b"someone-elses-key", Duration::days(30))
        .issue(PrincipalKind::User, &user_id)
        .unwrap();
    let (status, _) = send(
        &h.app,
        json_request(Method::GET, "/user/user-data", Some(&forged), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // User token on a company route
    let (status, _) = send(
        &h.app,
        json_request(Method::GET, "/company/company-data", Some(&user_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, principal gone
    let ghost = h.state.tokens.issue(PrincipalKind::User, "ghost").unwrap();
    let (status, _) = send(
        &h.app,
        json_request(Method::GET, "/user/user-data", Some(&ghost), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &h.app,
        json_request(Method::GET, "/user/user-data", Some(&user_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userData"]["id"], user_id.as_str());
}

#[tokio::test]
async fn test_job_and_application_lifecycle() {
    let h = setup().await;

    let (_, body) = register_company(&h.app, "Acme", "hr@acme.com").await;
    let company_token = token_of(&body);
    let company_id = body["companyData"]["id"].as_str().unwrap().to_string();

    let (_, body) = register_company(&h.app, "Rival", "hr@rival.com").await;
    let rival_token = token_of(&body);

    let (_, body) = register_user(&h.app, "U", "u@x.com").await;
    let user_token = token_of(&body);

    let job = post_job(&h.app, &company_token, "Rust Engineer").await;
    let job_id = job["id"].as_str().unwrap().to_string();
    assert_eq!(job["visible"], true);

    // Public listing shows the job with its company
    let (status, body) = send(&h.app, json_request(Method::GET, "/job/all-jobs", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["jobData"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["company"]["name"], "Acme");

    // Apply, then apply again
    let apply = || {
        json_request(
            Method::POST,
            "/user/apply-job",
            Some(&user_token),
            Some(json!({ "jobId": job_id })),
        )
    };
    let (status, body) = send(&h.app, apply()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["jobApplication"]["status"], "Pending");
    assert_eq!(body["jobApplication"]["companyId"], company_id.as_str());
    let application_id = body["jobApplication"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&h.app, apply()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You have already applied for this job");

    let (status, _) = send(
        &h.app,
        json_request(
            Method::POST,
            "/user/apply-job",
            Some(&user_token),
            Some(json!({ "jobId": "missing" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Company sees the applicant count
    let (status, body) = send(
        &h.app,
        json_request(Method::GET, "/company/company/posted-jobs", Some(&company_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobData"][0]["applicants"], 1);

    // Rival cannot hide the job
    let toggle = |token: &str| {
        json_request(
            Method::POST,
            "/company/change-visiblity",
            Some(token),
            Some(json!({ "id": job_id })),
        )
    };
    let (status, _) = send(&h.app, toggle(&rival_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = send(&h.app, json_request(Method::GET, "/job/all-jobs", None, None)).await;
    assert_eq!(body["jobData"].as_array().unwrap().len(), 1);

    // Owner hides it: gone from the public list, still in the company's own
    let (status, body) = send(&h.app, toggle(&company_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["visible"], false);
    let (_, body) = send(&h.app, json_request(Method::GET, "/job/all-jobs", None, None)).await;
    assert!(body["jobData"].as_array().unwrap().is_empty());
    let (_, body) = send(
        &h.app,
        json_request(Method::GET, "/company/company/posted-jobs", Some(&company_token), None),
    )
    .await;
    assert_eq!(body["jobData"].as_array().unwrap().len(), 1);

    // Applicants view
    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/company/view-applications", Some(&company_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["viewApplicationData"][0]["user"]["name"], "U");
    assert_eq!(body["viewApplicationData"][0]["job"]["title"], "Rust Engineer");

    // Status changes: only the receiving company, only known values
    let change = |token: &str, status: &str| {
        json_request(
            Method::POST,
            "/company/change-status",
            Some(token),
            Some(json!({ "id": application_id, "status": status })),
        )
    };
    let (status, _) = send(&h.app, change(&rival_token, "Rejected")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&h.app, change(&company_token, "Hired")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&h.app, change(&company_token, "Accepted")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "Accepted");

    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/user/get-user-applications", Some(&user_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mine = body["jobApplications"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["status"], "Accepted");
    assert_eq!(mine[0]["company"]["name"], "Acme");
}

#[tokio::test]
async fn test_post_job_requires_all_fields() {
    let h = setup().await;
    let (_, body) = register_company(&h.app, "Acme", "hr@acme.com").await;
    let token = token_of(&body);

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/company/post-job",
            Some(&token),
            Some(json!({ "title": "Half a job", "salary": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn test_upload_resume_and_serve_it() {
    let h = setup().await;
    let (_, body) = register_user(&h.app, "U", "u@x.com").await;
    let token = token_of(&body);

    let (status, body) = send(
        &h.app,
        multipart_request("/user/upload-resume", Some(&token), multipart(&[], &[])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Resume file is required");

    let form = multipart(&[], &[("resume", "cv.pdf", &b"%PDF-1.4 resume"[..])]);
    let (status, body) = send(&h.app, multipart_request("/user/upload-resume", Some(&token), form)).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["resumeUrl"].as_str().unwrap().to_string();
    assert!(url.ends_with(".pdf"));

    let path = &url[url.find("/media/").unwrap()..];
    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4 resume");

    let (_, body) = send(&h.app, json_request(Method::GET, "/user/user-data", Some(&token), None)).await;
    assert_eq!(body["userData"]["resume"], url.as_str());
}

struct FailingMedia;

#[async_trait]
impl MediaStore for FailingMedia {
    async fn upload(&self, _file: &UploadedFile) -> Result<String, MediaError> {
        Err(MediaError::Io(std::io::Error::other("media host down")))
    }
}

#[tokio::test]
async fn test_upload_failure_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let config = PortalConfig::with_base_dir(dir.path(), SECRET);
    let state = AppState::with_media(config, Arc::new(FailingMedia)).await.unwrap();
    let app = portal_server::app(state.clone());

    let (status, body) = register_user(&app, "A", "a@x.com").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Upload failed");

    let count = state.store.count_principals(PrincipalKind::User).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_uploaded_svg_is_not_served_as_svg() {
    let h = setup().await;
    let body = multipart(
        &[("name", "Evil"), ("email", "x@evil.com"), ("password", "pa55word")],
        &[("image", "logo.svg", &b"<svg><script>alert(1)</script></svg>"[..])],
    );
    let (status, body) = send(&h.app, multipart_request("/company/register-company", None, body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = body["companyData"]["image"].as_str().unwrap().to_string();

    let path = &url[url.find("/media/").unwrap()..];
    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_ne!(headers[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers[header::CONTENT_SECURITY_POLICY]
        .to_str()
        .unwrap()
        .contains("sandbox"));
}

#[tokio::test]
async fn test_missing_ids_and_unknown_records() {
    let h = setup().await;
    let (_, body) = register_company(&h.app, "Acme", "hr@acme.com").await;
    let company_token = token_of(&body);
    let (_, body) = register_user(&h.app, "U", "u@x.com").await;
    let user_token = token_of(&body);

    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/company/change-visiblity", Some(&company_token), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Job ID is required");

    for payload in [json!({ "status": "Accepted" }), json!({ "id": "some-id" }), json!({ "id": "some-id", "status": " " })] {
        let (status, body) = send(
            &h.app,
            json_request(Method::POST, "/company/change-status", Some(&company_token), Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Application ID and status are required");
    }

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/company/change-status",
            Some(&company_token),
            Some(json!({ "id": "no-such-application", "status": "Accepted" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/user/apply-job", Some(&user_token), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Job ID is required");

    let req = Request::builder()
        .method(Method::GET)
        .uri("/user/user-data")
        .header("token", HeaderValue::from_bytes(b"\xff\xfe").unwrap())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_post_job_salary_forms() {
    let h = setup().await;
    let (_, body) = register_company(&h.app, "Acme", "hr@acme.com").await;
    let token = token_of(&body);

    let job_with_salary = |salary: Value| {
        json_request(
            Method::POST,
            "/company/post-job",
            Some(&token),
            Some(json!({
                "title": "Rust Engineer",
                "description": "Build services in Rust",
                "location": "Remote",
                "level": "Senior",
                "salary": salary,
                "category": "Engineering",
            })),
        )
    };

    let (status, body) = send(&h.app, job_with_salary(json!("50000"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["job"]["salary"], 50000);

    let (status, body) = send(&h.app, job_with_salary(json!(0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");

    let (status, body) = send(&h.app, job_with_salary(json!("lots"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Salary must be a whole number");

    let (status, body) = send(&h.app, job_with_salary(json!(-5))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Salary must not be negative");
}

#[tokio::test]
async fn test_login_accepts_multipart_form() {
    let h = setup().await;
    register_user(&h.app, "U", "u@x.com").await;

    let form = multipart(&[("email", "u@x.com"), ("password", "pa55word")], &[]);
    let (status, body) = send(&h.app, multipart_request("/user/login-user", None, form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userData"]["email"], "u@x.com");
    assert!(!token_of(&body).is_empty());

    let form = multipart(&[("email", "u@x.com"), ("password", "nope")], &[]);
    let (status, body) = send(&h.app, multipart_request("/user/login-user", None, form)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}
