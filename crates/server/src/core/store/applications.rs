//! Application lifecycle and the read-side joins over it

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::{is_unique_violation, PortalStore};
use crate::core::error::{Error, Result};
use crate::core::models::{
    ApplicantSummary, Application, ApplicationStatus, CompanyApplicationView, CompanySummary,
    JobSummary, UserApplicationView,
};

#[derive(sqlx::FromRow)]
struct UserApplicationRow {
    id: String,
    status: ApplicationStatus,
    date: DateTime<Utc>,
    company_id: String,
    company_name: String,
    company_email: String,
    company_image: String,
    job_id: String,
    job_title: String,
    job_location: String,
    job_date: DateTime<Utc>,
}

impl From<UserApplicationRow> for UserApplicationView {
    fn from(row: UserApplicationRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            date: row.date,
            company: CompanySummary {
                id: row.company_id,
                name: row.company_name,
                email: row.company_email,
                image: row.company_image,
            },
            job: JobSummary {
                id: row.job_id,
                title: row.job_title,
                location: row.job_location,
                date: row.job_date,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct CompanyApplicationRow {
    id: String,
    status: ApplicationStatus,
    date: DateTime<Utc>,
    user_id: String,
    user_name: String,
    user_image: String,
    user_resume: Option<String>,
    job_id: String,
    job_title: String,
    job_location: String,
    job_date: DateTime<Utc>,
}

impl From<CompanyApplicationRow> for CompanyApplicationView {
    fn from(row: CompanyApplicationRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            date: row.date,
            user: ApplicantSummary {
                id: row.user_id,
                name: row.user_name,
                image: row.user_image,
                resume: row.user_resume,
            },
            job: JobSummary {
                id: row.job_id,
                title: row.job_title,
                location: row.job_location,
                date: row.job_date,
            },
        }
    }
}

impl PortalStore {
    /// Record a user's application. The owning company is copied from the job.
    ///
    /// Duplicate detection is the `UNIQUE(user_id, job_id)` constraint, so two
    /// racing calls cannot both insert.
    pub async fn apply(&self, user_id: &str, job_id: &str) -> Result<Application> {
        let job = self.find_job(job_id).await?.ok_or(Error::JobNotFound)?;

        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (id, user_id, company_id, job_id, date)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&job.company_id)
        .bind(&job.id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::AlreadyApplied
            } else {
                Error::Store(e)
            }
        })?;

        info!("[Store] User {} applied to job {}", user_id, job_id);
        Ok(application)
    }

    pub async fn list_applications_for_user(&self, user_id: &str) -> Result<Vec<UserApplicationView>> {
        let rows = sqlx::query_as::<_, UserApplicationRow>(
            r#"
            SELECT a.id, a.status, a.date,
                   c.id AS company_id, c.name AS company_name,
                   c.email AS company_email, c.image AS company_image,
                   j.id AS job_id, j.title AS job_title,
                   j.location AS job_location, j.date AS job_date
            FROM applications a
            JOIN companies c ON c.id = a.company_id
            JOIN jobs j ON j.id = a.job_id
            WHERE a.user_id = ?
            ORDER BY a.date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserApplicationView::from).collect())
    }

    pub async fn list_applicants_for_company(
        &self,
        company_id: &str,
    ) -> Result<Vec<CompanyApplicationView>> {
        let rows = sqlx::query_as::<_, CompanyApplicationRow>(
            r#"
            SELECT a.id, a.status, a.date,
                   u.id AS user_id, u.name AS user_name,
                   u.image AS user_image, u.resume AS user_resume,
                   j.id AS job_id, j.title AS job_title,
                   j.location AS job_location, j.date AS job_date
            FROM applications a
            JOIN users u ON u.id = a.user_id
            JOIN jobs j ON j.id = a.job_id
            WHERE a.company_id = ?
            ORDER BY a.date DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CompanyApplicationView::from).collect())
    }

    /// Overwrite the status of an application the company received
    pub async fn set_status(
        &self,
        application_id: &str,
        company_id: &str,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let updated = sqlx::query_as::<_, Application>(
            "UPDATE applications SET status = ? WHERE id = ? AND company_id = ? RETURNING *",
        )
        .bind(status)
        .bind(application_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(application) = updated {
            info!("[Store] Application {} -> {}", application.id, status);
            return Ok(application);
        }

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM applications WHERE id = ?")
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Err(Error::Forbidden("This application was not made to your company")),
            None => Err(Error::ApplicationNotFound),
        }
    }
}
