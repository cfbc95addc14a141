//! Fact log endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use raven_core::error::RavenError;
use raven_core::types::Fact;

use crate::error::ApiResult;
use crate::state::AppState;

/// Request body for `POST /facts`.
///
/// Either an explicit `key`/`value` pair or a `text` in `/remember` syntax.
#[derive(Debug, Deserialize)]
pub struct AddFactRequest {
    pub key: Option<String>,
    pub value: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddFactResponse {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Store a fact.
/// POST /facts
pub async fn add_fact(
    State(state): State<AppState>,
    Json(request): Json<AddFactRequest>,
) -> ApiResult<Json<AddFactResponse>> {
    let (key, value) = match (request.key, request.value, request.text) {
        (Some(key), Some(value), _) => {
            state.conversation.remember(&key, &value)?;
            (key.trim().to_string(), value.trim().to_string())
        }
        (None, None, Some(text)) => state.conversation.remember_command(&text)?,
        _ => {
            return Err(
                RavenError::missing_field("provide either key and value, or text").into(),
            )
        }
    };

    Ok(Json(AddFactResponse { key, value }))
}

/// Most recent facts first.
/// GET /facts?limit=
pub async fn list_facts(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Fact>>> {
    let limit = query
        .limit
        .unwrap_or(state.conversation.config().facts_limit);
    Ok(Json(state.conversation.recent_facts(limit)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::create_router;
    use crate::routes::test_support::{call, conversation};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_add_and_list_facts() {
        let router = create_router(AppState::new(conversation(Some("ok"))));

        let (status, body) = call(
            router.clone(),
            "POST",
            "/facts",
            Some(json!({ "key": "song", "value": "Nightcall" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["key"], "song");

        let (status, body) = call(
            router.clone(),
            "POST",
            "/facts",
            Some(json!({ "text": "Запомни: она любит дождь" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["key"], "note");

        let (status, body) = call(router, "GET", "/facts?limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let facts = body.as_array().unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0]["key"], "note");
    }

    #[tokio::test]
    async fn test_incomplete_fact_is_rejected() {
        let router = create_router(AppState::new(conversation(Some("ok"))));
        let (status, body) = call(router, "POST", "/facts", Some(json!({ "key": "song" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VAL_002");
    }
}
