//! `GET /logs/:id`: audit entry lookup.

use agentic_passport::time;
use agentic_passport::{AuditEntry, LogId};
use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditEntry>, ApiError> {
    let entry = time::bounded(
        state.config.ledger_timeout,
        "ledger get_log",
        state.ledger.get_log(&LogId(id)),
    )
    .await?;
    Ok(Json(entry))
}
