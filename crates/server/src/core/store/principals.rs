//! Credential store: users and companies

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{is_unique_violation, PortalStore};
use crate::core::error::{Error, Result};
use crate::core::models::{Credentials, NewPrincipal, Principal, PrincipalKind, User};

impl PortalStore {
    /// Insert a principal. A taken email surfaces as `DuplicateIdentity`.
    pub async fn register<P: Principal>(&self, new: NewPrincipal) -> Result<P> {
        let kind = P::KIND;
        let id = Uuid::new_v4().to_string();

        let sql = format!(
            "INSERT INTO {} (id, name, email, password_hash, image, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.image)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::DuplicateIdentity(kind)
                } else {
                    Error::Store(e)
                }
            })?;

        info!("[Store] {} created: {}", kind, id);

        self.find_by_id(&id)
            .await?
            .ok_or(Error::PrincipalNotFound(kind))
    }

    pub async fn find_credentials(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Credentials>> {
        let sql = format!("SELECT id, password_hash FROM {} WHERE email = ?", kind.table());
        Ok(sqlx::query_as::<_, Credentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Load the public profile of a principal
    pub async fn find_by_id<P: Principal>(&self, id: &str) -> Result<Option<P>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            P::KIND.profile_columns(),
            P::KIND.table()
        );
        Ok(sqlx::query_as::<_, P>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn count_principals(&self, kind: PrincipalKind) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Attach a resume URL to a user. `None` if the user does not exist.
    pub async fn set_resume(&self, user_id: &str, resume_url: &str) -> Result<Option<User>> {
        let result = sqlx::query("UPDATE users SET resume = ? WHERE id = ?")
            .bind(resume_url)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(user_id).await
    }
}
