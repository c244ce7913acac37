//! `POST /log-action`: governance events from wrapped agents.
//!
//! Each event becomes a `Recorded` ledger entry. The action is the event
//! name, the target its details and the outcome the pipeline phase. Only
//! registered agents may log; a wrapper registers itself first.

use agentic_passport::time;
use agentic_passport::{AgentId, AuditEntry, GovernanceEvent, TxId};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActionResponse {
    pub tx_id: TxId,
}

pub async fn log_action(
    State(state): State<AppState>,
    body: Result<Json<GovernanceEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<LogActionResponse>), ApiError> {
    let Json(event) = body?;
    if event.agent_id.trim().is_empty() || event.action.trim().is_empty() {
        return Err(ApiError::Validation(
            "agentId and action must not be empty".into(),
        ));
    }

    let agent_id = AgentId::new(event.agent_id.as_str());
    state.registry.get(&agent_id).await?;

    let outcome = event.phase().unwrap_or("event").to_string();
    let entry = AuditEntry::recorded(agent_id, event.action.as_str(), event.details, outcome);
    let tx_id = time::bounded(
        state.config.ledger_timeout,
        "ledger log_action",
        state.ledger.log_action(&entry),
    )
    .await?;

    tracing::debug!(
        agent_id = %entry.agent_id,
        action = %entry.action,
        tx_id = %tx_id,
        "governance event logged"
    );
    Ok((StatusCode::CREATED, Json(LogActionResponse { tx_id })))
}
