use crate::core::config::AppState;
use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use crate::core::models::{Company, Principal, User};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Request header carrying the bearer token.
pub const TOKEN_HEADER: &str = "token";

pub async fn mw_require_user(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_user");
    require_principal::<User>(&state, req, next).await
}

pub async fn mw_require_company(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_company");
    require_principal::<Company>(&state, req, next).await
}

async fn require_principal<P: Principal>(
    state: &AppState,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = match req.headers().get(TOKEN_HEADER) {
        Some(h) => h.to_str().map_err(|_| Error::AuthFailInvalidToken)?,
        None => return Err(Error::AuthFailNoToken),
    };

    let claims = state.tokens.verify(token.trim())?;
    if claims.kind != P::KIND {
        debug!("token kind {} presented to {} route", claims.kind, P::KIND);
        return Err(Error::AuthFailWrongKind);
    }

    let principal: P = state
        .store
        .find_by_id(&claims.sub)
        .await?
        .ok_or(Error::PrincipalNotFound(P::KIND))?;

    req.extensions_mut().insert(Ctx::new(principal));

    Ok(next.run(req).await)
}
