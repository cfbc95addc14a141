//! Dialog log and relationship state.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use raven_core::types::{DialogMessage, EmotionalState, Mode};

use super::facts::LimitQuery;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub state: EmotionalState,
    pub mood: Mode,
    pub summary: String,
}

/// Trailing dialog rows, oldest first.
/// GET /history?limit=
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<DialogMessage>>> {
    let limit = query
        .limit
        .unwrap_or(state.conversation.config().history_window);
    Ok(Json(state.conversation.recent_messages(limit)?))
}

/// GET /state
pub async fn get_state(State(state): State<AppState>) -> ApiResult<Json<StateResponse>> {
    let current = state.conversation.state()?;
    Ok(Json(StateResponse {
        mood: current.mood(),
        summary: current.summary(),
        state: current,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::create_router;
    use crate::routes::test_support::{call, conversation};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_initial_state() {
        let router = create_router(AppState::new(conversation(Some("ok"))));
        let (status, body) = call(router, "GET", "/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["love"], 0.85);
        assert_eq!(body["anger"], 0.2);
        assert!(body["summary"].as_str().unwrap().contains("LOVE=0.85"));
    }

    #[tokio::test]
    async fn test_history_after_turn() {
        let router = create_router(AppState::new(conversation(Some("здесь"))));
        call(
            router.clone(),
            "POST",
            "/messages",
            Some(json!({ "text": "ты где?" })),
        )
        .await;

        let (status, body) = call(router, "GET", "/history", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["role"], "user");
        assert_eq!(rows[1]["role"], "assistant");
        assert_eq!(rows[1]["content"], "здесь");
    }
}
