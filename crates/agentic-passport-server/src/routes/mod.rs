//! Route handlers, grouped by resource.

pub mod admin;
pub mod execute;
pub mod governance;
pub mod logs;
pub mod membership;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Every route, served both at the root and under `/api`.
pub fn router() -> Router<AppState> {
    let routes = resources();
    Router::new().merge(routes.clone()).nest("/api", routes)
}

fn resources() -> Router<AppState> {
    Router::new()
        .route("/admin/register-agent", post(admin::register_agent))
        .route("/admin/agents/:id", get(admin::get_agent))
        .route("/admin/agents/:id/revoke", post(admin::revoke_agent))
        .route("/agents", get(admin::list_agents))
        .route("/execute", post(execute::execute))
        .route("/log-action", post(governance::log_action))
        .route("/logs/:id", get(logs::get_log))
        .route("/membership/prove", post(membership::prove))
        .route("/membership/verify", post(membership::verify))
}
