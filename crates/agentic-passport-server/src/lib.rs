//! HTTP surface for AgenticPassport.
//!
//! Every route is served at the root and again under `/api`.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /admin/register-agent` | issue a passport |
//! | `GET /admin/agents/:id` | fetch the ledger copy of a passport |
//! | `POST /admin/agents/:id/revoke` | revoke a passport |
//! | `GET /agents` | list passports |
//! | `POST /execute` | authorize an intent and append an audit entry |
//! | `POST /log-action` | record a governance event |
//! | `GET /logs/:id` | fetch an audit entry |
//! | `POST /membership/prove` | prove allowlist membership |
//! | `POST /membership/verify` | check a membership proof, attesting it when `agentId` is given |

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
