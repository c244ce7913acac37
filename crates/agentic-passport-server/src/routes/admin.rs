//! Passport administration: registration, lookup, listing and revocation.

use agentic_passport::{AgentId, Passport, Role};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    /// Caller-chosen id; a fresh one is minted when absent.
    #[serde(default)]
    pub agent_id: Option<String>,
    pub role: String,
    pub purpose: String,
    pub mission_scope: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterAgentResponse {
    pub passport: Passport,
}

/// `POST /admin/register-agent`
pub async fn register_agent(
    State(state): State<AppState>,
    body: Result<Json<RegisterAgentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterAgentResponse>), ApiError> {
    let Json(req) = body?;
    let role = Role::from(req.role);
    let passport = match req.agent_id {
        Some(id) => {
            state
                .registry
                .issue_passport_with_id(AgentId::new(id), role, &req.purpose, &req.mission_scope)
                .await?
        }
        None => {
            state
                .registry
                .issue_passport(role, &req.purpose, &req.mission_scope)
                .await?
        }
    };
    tracing::info!(agent_id = %passport.agent_id, role = %passport.role, "agent registered");
    Ok((StatusCode::CREATED, Json(RegisterAgentResponse { passport })))
}

/// `GET /admin/agents/:id`
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Passport>, ApiError> {
    Ok(Json(state.registry.get(&AgentId::new(id)).await?))
}

/// `POST /admin/agents/:id/revoke`
///
/// Responds with the passport as it now stands on the ledger.
pub async fn revoke_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Passport>, ApiError> {
    let agent_id = AgentId::new(id);
    state.registry.revoke(&agent_id).await?;
    tracing::info!(agent_id = %agent_id, "agent revoked");
    Ok(Json(state.registry.get(&agent_id).await?))
}

/// `GET /agents`
pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Vec<Passport>>, ApiError> {
    Ok(Json(state.registry.list().await?))
}
