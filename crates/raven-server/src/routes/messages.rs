//! Conversation turns.

use axum::{extract::State, Json};
use serde::Deserialize;

use raven_core::types::Inbound;
use raven_core::TurnOutcome;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for `POST /messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
    /// The text is a voice transcript.
    #[serde(default)]
    pub voice: bool,
}

/// Run one turn.
/// POST /messages
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<TurnOutcome>> {
    if request.text.trim().is_empty() {
        return Err(ApiError::validation("text must not be empty"));
    }

    let inbound = if request.voice {
        Inbound::voice(request.text)
    } else {
        Inbound::text(request.text)
    };

    let outcome = state.conversation.handle(inbound).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::create_router;
    use crate::routes::test_support::{app, call, conversation};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_turn_returns_reply_and_state() {
        let (status, body) = call(
            app(Some("и я тебя")),
            "POST",
            "/messages",
            Some(json!({ "text": "люблю тебя" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "и я тебя");
        assert_eq!(body["triggered"], json!(["affection"]));
        assert!((body["state"]["love"].as_f64().unwrap() - 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_voice_turn_is_logged_with_prefix() {
        let conversation = conversation(Some("слышу"));
        let router = create_router(AppState::new(Arc::clone(&conversation)));

        let (status, _) = call(
            router,
            "POST",
            "/messages",
            Some(json!({ "text": "привет", "voice": true })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let rows = conversation.recent_messages(2).unwrap();
        assert_eq!(rows[0].content, "(voice) привет");
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let (status, body) = call(
            app(Some("ok")),
            "POST",
            "/messages",
            Some(json!({ "text": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generation_failure_is_bad_gateway() {
        let (status, body) = call(
            app(None),
            "POST",
            "/messages",
            Some(json!({ "text": "привет" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_002");
    }
}
