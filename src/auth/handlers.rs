use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, ProfileResponse, RegisterRequest,
            UpdateProfileRequest, UpdatedProfileResponse,
        },
        extractors::{require, CurrentUser, Gate, GateLayer},
        repo_types::PrincipalKind,
        services,
    },
    error::ApiError,
    state::AppState,
};

const PROFILE_GATES: &[Gate] = &[Gate::Protect];

pub const EXPIRED_JWT_COOKIE: &str =
    "jwt=; HttpOnly; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT";

pub fn user_routes(state: &AppState) -> Router<AppState> {
    let profile = Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            GateLayer::new(state.clone(), PROFILE_GATES),
            require,
        ));

    Router::new()
        .route("/users/register", post(register_user))
        .route("/users/login", post(login_user))
        .route("/users/logout", post(logout))
        .merge(profile)
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admins/register", post(register_admin))
        .route("/admins/login", post(login_admin))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    let out = services::register(&state, PrincipalKind::User, payload).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(skip(state, payload))]
pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(services::login(&state, PrincipalKind::User, payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn register_admin(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    let out = services::register(&state, PrincipalKind::Admin, payload).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(skip(state, payload))]
pub async fn login_admin(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(services::login(&state, PrincipalKind::Admin, payload).await?))
}

/// Tokens are stateless; logout only clears the cookie a browser client may hold.
#[instrument]
pub async fn logout() -> impl IntoResponse {
    info!("logout");
    (
        [(SET_COOKIE, EXPIRED_JWT_COOKIE)],
        Json(MessageResponse::new("Logged out successfully")),
    )
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(user.into())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UpdatedProfileResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(services::update_profile(&state, user, payload).await?))
}
