use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use std::fmt;
use std::str::FromStr;

/// The two kinds of authenticated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Company,
}

impl PrincipalKind {
    pub fn table(self) -> &'static str {
        match self {
            PrincipalKind::User => "users",
            PrincipalKind::Company => "companies",
        }
    }

    /// Columns safe to hand out; never includes `password_hash`.
    pub fn profile_columns(self) -> &'static str {
        match self {
            PrincipalKind::User => "id, name, email, image, resume, created_at",
            PrincipalKind::Company => "id, name, email, image, created_at",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::User => write!(f, "user"),
            PrincipalKind::Company => write!(f, "company"),
        }
    }
}

/// A profile record that can be loaded by the identity middleware.
pub trait Principal:
    for<'r> sqlx::FromRow<'r, SqliteRow> + Serialize + Clone + Send + Sync + Unpin + 'static
{
    const KIND: PrincipalKind;

    fn id(&self) -> &str;
}

/// Job seeker profile (no sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub resume: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Principal for User {
    const KIND: PrincipalKind = PrincipalKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Hiring company profile (no sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl Principal for Company {
    const KIND: PrincipalKind = PrincipalKind::Company;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Stored login material for a principal
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credentials {
    pub id: String,
    pub password_hash: String,
}

/// Fields supplied at registration. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub image: String,
}

/// A job posting owned by one company
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub level: String,
    pub salary: i64,
    pub category: String,
    pub company_id: String,
    pub date: DateTime<Utc>,
    pub visible: bool,
}

/// Descriptive fields of a new posting
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub level: String,
    pub salary: i64,
    pub category: String,
}

/// Application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A user's application to a job. Unique per (user, job).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub company_id: String,
    pub job_id: String,
    pub status: ApplicationStatus,
    pub date: DateTime<Utc>,
}

// --- Aggregation views ---

/// Public listing entry: a visible job with its owner's profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub company: Company,
}

/// A company's own job with the number of applications it received
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobWithApplicants {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub job: Job,
    pub applicants: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub location: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub resume: Option<String>,
}

/// One of a user's applications, as shown to that user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserApplicationView {
    pub id: String,
    pub status: ApplicationStatus,
    pub date: DateTime<Utc>,
    pub company: CompanySummary,
    pub job: JobSummary,
}

/// One application received by a company
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyApplicationView {
    pub id: String,
    pub status: ApplicationStatus,
    pub date: DateTime<Utc>,
    pub user: ApplicantSummary,
    pub job: JobSummary,
}
