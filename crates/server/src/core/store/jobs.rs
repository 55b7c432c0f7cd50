//! Job catalog

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::PortalStore;
use crate::core::error::{Error, Result};
use crate::core::models::{Company, Job, JobListing, JobWithApplicants, NewJob};

/// Flat row of a job joined with its company
#[derive(sqlx::FromRow)]
struct JobListingRow {
    #[sqlx(flatten)]
    job: Job,
    company_name: String,
    company_email: String,
    company_image: String,
    company_created_at: DateTime<Utc>,
}

impl From<JobListingRow> for JobListing {
    fn from(row: JobListingRow) -> Self {
        let company = Company {
            id: row.job.company_id.clone(),
            name: row.company_name,
            email: row.company_email,
            image: row.company_image,
            created_at: row.company_created_at,
        };
        Self {
            job: row.job,
            company,
        }
    }
}

impl PortalStore {
    /// Create a posting. Visibility comes from the schema default.
    pub async fn post_job(&self, company_id: &str, new: NewJob) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, title, description, location, level, salary, category, company_id, date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.location)
        .bind(&new.level)
        .bind(new.salary)
        .bind(&new.category)
        .bind(company_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!("[Store] Job {} posted by {}", job.id, company_id);
        Ok(job)
    }

    pub async fn find_job(&self, job_id: &str) -> Result<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Public listing: visible jobs only, each with its company profile
    pub async fn list_visible_jobs(&self) -> Result<Vec<JobListing>> {
        let rows = sqlx::query_as::<_, JobListingRow>(
            r#"
            SELECT j.*,
                   c.name AS company_name,
                   c.email AS company_email,
                   c.image AS company_image,
                   c.created_at AS company_created_at
            FROM jobs j
            JOIN companies c ON c.id = j.company_id
            WHERE j.visible = 1
            ORDER BY j.date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(JobListing::from).collect())
    }

    /// Every job the company owns, hidden ones included, with applicant counts
    pub async fn list_jobs_for_company(&self, company_id: &str) -> Result<Vec<JobWithApplicants>> {
        Ok(sqlx::query_as::<_, JobWithApplicants>(
            r#"
            SELECT j.*, COUNT(a.id) AS applicants
            FROM jobs j
            LEFT JOIN applications a ON a.job_id = j.id
            WHERE j.company_id = ?
            GROUP BY j.id
            ORDER BY j.date DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Flip the visibility flag. Only the owning company may do this.
    pub async fn toggle_visibility(&self, job_id: &str, company_id: &str) -> Result<Job> {
        let updated = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET visible = NOT visible WHERE id = ? AND company_id = ? RETURNING *",
        )
        .bind(job_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(job) => {
                info!("[Store] Job {} visible={}", job.id, job.visible);
                Ok(job)
            }
            None if self.find_job(job_id).await?.is_some() => {
                Err(Error::Forbidden("You do not own this job"))
            }
            None => Err(Error::JobNotFound),
        }
    }
}
