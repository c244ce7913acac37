//! `POST /execute`: authorize an intent for a passport holder.

use agentic_passport::{Authorization, Intent, Passport, TxId};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub passport: Passport,
    pub intent: Intent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub tx_id: TxId,
}

/// Responds `200 {txId}` on success and `403 {error}` for any denial.
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let Json(req) = body?;
    match state.authorizer.execute(&req.passport, &req.intent).await? {
        Authorization::Allowed { tx_id, .. } => {
            tracing::info!(
                agent_id = %req.passport.agent_id,
                action = %req.intent.action,
                tx_id = %tx_id,
                "execute allowed"
            );
            Ok(Json(ExecuteResponse { tx_id }))
        }
        Authorization::Denied(denial) => {
            tracing::info!(
                agent_id = %req.passport.agent_id,
                stage = ?denial.stage,
                reason = %denial.reason,
                "execute denied"
            );
            Err(denial.reason.into())
        }
    }
}
