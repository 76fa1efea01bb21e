use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub(crate) mod extractors;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;
#[cfg(test)]
mod testing;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
