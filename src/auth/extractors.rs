//! Principal resolution. Each protected route declares an ordered list of [`Gate`]s; the
//! [`require`] middleware runs them before the handler and stores the resulting
//! [`RequestContext`] in request extensions, where [`CurrentUser`] / [`CurrentAdmin`]
//! pick it up.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::repo_types::{AdminRecord, Principal, PrincipalKind, UserRecord};
use crate::error::ApiError;
use crate::state::AppState;

pub const NO_TOKEN: &str = "Not authorized, no token provided";
pub const BAD_TOKEN: &str = "Not authorized, invalid or expired token";
pub const NO_USER: &str = "Not authorized, user not found";
pub const NOT_ADMIN: &str = "Access denied. Not an admin account.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Token id must resolve in the users collection.
    Protect,
    /// Token id must resolve in the admins collection.
    AdminOnly,
}

/// What the gates of a route resolved, in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<UserRecord>,
    pub admin: Option<AdminRecord>,
}

/// Extracts `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthenticated(NO_TOKEN))
}

impl Gate {
    pub async fn apply(
        self,
        state: &AppState,
        headers: &HeaderMap,
        mut ctx: RequestContext,
    ) -> Result<RequestContext, ApiError> {
        let token = bearer_token(headers)?;
        let claims = state.keys.verify(token).map_err(|_| {
            warn!(gate = ?self, "invalid or expired token");
            ApiError::Unauthenticated(BAD_TOKEN)
        })?;

        match self {
            Gate::Protect => {
                let user = state
                    .credentials
                    .find_by_id(PrincipalKind::User, claims.id)
                    .await?
                    .and_then(Principal::into_user)
                    .ok_or_else(|| {
                        warn!(principal_id = %claims.id, "token id is not a user");
                        ApiError::Unauthenticated(NO_USER)
                    })?;
                ctx.user = Some(user);
            }
            Gate::AdminOnly => {
                let admin = state
                    .credentials
                    .find_by_id(PrincipalKind::Admin, claims.id)
                    .await?
                    .and_then(Principal::into_admin)
                    .ok_or_else(|| {
                        warn!(principal_id = %claims.id, "token id is not an admin");
                        ApiError::Forbidden(NOT_ADMIN)
                    })?;
                ctx.admin = Some(admin);
            }
        }
        Ok(ctx)
    }
}

/// Runs `gates` in order; the first failure short-circuits.
pub async fn resolve(
    state: &AppState,
    headers: &HeaderMap,
    gates: &[Gate],
) -> Result<RequestContext, ApiError> {
    let mut ctx = RequestContext::default();
    for gate in gates {
        ctx = gate.apply(state, headers, ctx).await?;
    }
    Ok(ctx)
}

/// Middleware state: the app plus the gate list of the routes it wraps.
#[derive(Clone)]
pub struct GateLayer {
    state: AppState,
    gates: &'static [Gate],
}

impl GateLayer {
    pub fn new(state: AppState, gates: &'static [Gate]) -> Self {
        Self { state, gates }
    }
}

pub async fn require(
    State(layer): State<GateLayer>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = resolve(&layer.state, req.headers(), layer.gates).await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// The user resolved by a `Protect` gate.
pub struct CurrentUser(pub UserRecord);

/// The admin resolved by an `AdminOnly` gate.
pub struct CurrentAdmin(pub AdminRecord);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.user.clone())
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated(NO_TOKEN))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.admin.clone())
            .map(CurrentAdmin)
            .ok_or(ApiError::Unauthenticated(NO_TOKEN))
    }
}
