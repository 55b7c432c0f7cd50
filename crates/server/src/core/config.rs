//! Portal server configuration

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Duration;

use crate::core::auth::TokenService;
use crate::core::media::{LocalMediaStore, MediaStore};
use crate::core::store::PortalStore;

const DEFAULT_BCRYPT_COST: u32 = 10;

/// Configuration for the Job Portal Server
#[derive(Clone, Debug)]
pub struct PortalConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// SQLite connection string
    pub database_url: String,
    /// Symmetric key used to sign tokens
    pub jwt_secret: String,
    /// Lifetime of every issued token
    pub token_ttl: Duration,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Directory holding uploaded images and resumes
    pub media_dir: PathBuf,
    /// Base URL prepended to media links handed to clients
    pub public_base_url: String,
    /// Max request body size in MB
    pub max_upload_mb: usize,
}

impl PortalConfig {
    /// Read configuration from the environment. `JWT_SECRET` is mandatory.
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = env_or("PORT", 5000)?;

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must be set");
        }

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://portal_data/portal.sqlite".to_string()),
            jwt_secret,
            token_ttl: Duration::days(env_or("TOKEN_TTL_DAYS", 30)?),
            bcrypt_cost: env_or("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            media_dir: std::env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("portal_data/media")),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            max_upload_mb: env_or("MAX_UPLOAD_MB", 10)?,
        })
    }

    /// Create a self-contained config rooted in `base_dir`
    pub fn with_base_dir(base_dir: impl AsRef<Path>, jwt_secret: impl Into<String>) -> Self {
        let base = base_dir.as_ref();
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: format!(
                "sqlite://{}",
                base.join("portal.sqlite").to_string_lossy().replace('\\', "/")
            ),
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::days(30),
            bcrypt_cost: 4,
            media_dir: base.join("media"),
            public_base_url: "http://localhost".to_string(),
            max_upload_mb: 10,
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.media_dir).await?;
        if let Some(parent) = self.sqlite_path().and_then(|p| p.parent().map(Path::to_path_buf)) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    fn sqlite_path(&self) -> Option<PathBuf> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Some(PathBuf::from(path))
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {}", key, raw)),
        _ => Ok(default),
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub store: Arc<PortalStore>,
    pub tokens: Arc<TokenService>,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    /// Build state with the local media host
    pub async fn new(config: PortalConfig) -> anyhow::Result<Self> {
        let media = LocalMediaStore::new(&config.media_dir, &config.public_base_url).await?;
        Self::with_media(config, Arc::new(media)).await
    }

    pub async fn with_media(config: PortalConfig, media: Arc<dyn MediaStore>) -> anyhow::Result<Self> {
        config.ensure_dirs().await?;

        let store = PortalStore::connect(&config.database_url)
            .await
            .context("Failed to open portal store")?;
        let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            tokens: Arc::new(tokens),
            media,
        })
    }

    pub fn accounts(&self) -> crate::core::auth::Accounts<'_> {
        crate::core::auth::Accounts::new(&self.store, &self.tokens, self.config.bcrypt_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_config_points_inside_dir() {
        let config = PortalConfig::with_base_dir("/tmp/portal-test", "secret");
        assert_eq!(
            config.sqlite_path(),
            Some(PathBuf::from("/tmp/portal-test/portal.sqlite"))
        );
        assert_eq!(config.media_dir, PathBuf::from("/tmp/portal-test/media"));
        assert_eq!(config.token_ttl, Duration::days(30));
    }

    #[test]
    fn test_memory_url_has_no_path() {
        let mut config = PortalConfig::with_base_dir("/tmp/x", "secret");
        config.database_url = "sqlite::memory:".to_string();
        assert_eq!(config.sqlite_path(), None);
    }
}
