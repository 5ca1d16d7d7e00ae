use crate::state::AppState;
use axum::Router;

mod dto;
pub mod eligibility;
pub mod handlers;
pub(crate) mod services;

pub fn router() -> Router<AppState> {
    handlers::lending_routes()
}
