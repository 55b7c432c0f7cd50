//! Authentication Module
//!
//! Password hashing, token issuance and the login flow shared by users
//! and companies. Identity resolution per request lives in `middleware`.

pub mod middleware;
pub mod token;

pub use token::{Claims, TokenError, TokenService};

use bcrypt::{hash, verify};
use tracing::{info, warn};

use crate::core::error::{Error, Result};
use crate::core::models::{NewPrincipal, Principal};
use crate::core::store::PortalStore;

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    Ok(verify(password, password_hash)?)
}

/// Account operations for one principal kind
pub struct Accounts<'a> {
    store: &'a PortalStore,
    tokens: &'a TokenService,
    bcrypt_cost: u32,
}

impl<'a> Accounts<'a> {
    pub fn new(store: &'a PortalStore, tokens: &'a TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// Fail early when the identity is taken so callers can skip the upload.
    pub async fn ensure_available<P: Principal>(&self, email: &str) -> Result<()> {
        if self.store.find_credentials(P::KIND, email).await?.is_some() {
            return Err(Error::DuplicateIdentity(P::KIND));
        }
        Ok(())
    }

    /// Create the principal and issue its first token.
    pub async fn register<P: Principal>(
        &self,
        name: String,
        email: String,
        password: &str,
        image: String,
    ) -> Result<(P, String)> {
        let password_hash = hash_password(password, self.bcrypt_cost)?;

        let principal: P = self
            .store
            .register(NewPrincipal {
                name,
                email,
                password_hash,
                image,
            })
            .await?;

        let token = self.tokens.issue(P::KIND, principal.id())?;
        info!("[Auth] {} registered: {}", P::KIND, principal.id());

        Ok((principal, token))
    }

    pub async fn login<P: Principal>(&self, email: &str, password: &str) -> Result<(P, String)> {
        let credentials = self
            .store
            .find_credentials(P::KIND, email)
            .await?
            .ok_or(Error::LoginFail)?;

        if !verify_password(password, &credentials.password_hash)? {
            warn!("[Auth] Failed {} login attempt for {}", P::KIND, email);
            return Err(Error::LoginFail);
        }

        let principal: P = self
            .store
            .find_by_id(&credentials.id)
            .await?
            .ok_or(Error::PrincipalNotFound(P::KIND))?;

        let token = self.tokens.issue(P::KIND, principal.id())?;
        info!("[Auth] {} logged in: {}", P::KIND, principal.id());

        Ok((principal, token))
    }
}
