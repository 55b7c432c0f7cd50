use crate::core::error::{Error, Result};
use axum::{extract::FromRequestParts, http::request::Parts};

/// The authenticated principal attached by the identity middleware.
#[derive(Clone, Debug)]
pub struct Ctx<P> {
    principal: P,
}

impl<P> Ctx<P> {
    pub fn new(principal: P) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &P {
        &self.principal
    }

    pub fn into_principal(self) -> P {
        self.principal
    }
}

impl<P, S> FromRequestParts<S> for Ctx<P>
where
    P: Clone + Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Ctx<P>>()
            .cloned()
            .ok_or(Error::AuthFailCtxNotInRequestExt)
    }
}
