//! API route handlers

pub mod admin;
pub mod swap;

use axum::Router;

use crate::server::AppState;

/// Routes mounted under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(swap::router())
        .nest("/admin", admin::router())
}
