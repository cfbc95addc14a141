//! Manual outreach trigger.

use axum::{extract::State, Json};

use raven_core::OutreachResult;

use crate::error::ApiResult;
use crate::state::AppState;

/// Run the outreach job once, outside its schedule.
/// POST /outreach
pub async fn trigger_outreach(State(state): State<AppState>) -> ApiResult<Json<OutreachResult>> {
    let result = match &state.outreach {
        Some(outreach) => outreach.run_once().await,
        None => OutreachResult::Skipped {
            reason: "outreach is not configured".to_string(),
        },
    };
    Ok(Json(result))
}
