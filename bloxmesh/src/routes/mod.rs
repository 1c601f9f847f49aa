mod automation;
mod cron;
mod members;

use axum::{
    http::HeaderMap,
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

pub const ACTOR_HEADER: &str = "x-bloxmesh-actor";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/groups/{id}/automation",
            get(automation::get_automation).post(automation::post_automation),
        )
        .route("/groups/{id}/members/{user_id}", delete(members::kick))
        .route(
            "/cron/process-suspensions",
            get(cron::process_suspensions).post(cron::process_suspensions),
        )
        .with_state(state)
}

/// The operator named by the dashboard, recorded in audit entries.
fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
