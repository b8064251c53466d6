use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

/// User and admin account routes. Takes the state because the profile gate needs it.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes(state))
        .merge(handlers::admin_routes())
}
