//! Server-side conversations with managed context.
//!
//! - POST   /api/v1/conversations/{id}/turns  run one turn
//! - GET    /api/v1/conversations/{id}        model, turn count, digest
//! - DELETE /api/v1/conversations/{id}        forget the conversation
//!
//! Conversations are created on their first turn and live in memory. A turn
//! for a conversation that is still answering another one gets 409.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info};
use uuid::Uuid;

use parley_core::context::{Conversation, SummaryStore};
use parley_types::error::ContextError;
use parley_types::context::{Digest, Turn};
use parley_types::llm::{CompletionRequest, Usage};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::http::state::ProxyState;

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub message: String,
    /// Switches the conversation's model before the turn.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub conversation_id: Uuid,
    pub response: String,
    pub model: String,
    /// Whether older turns were folded into the digest during this turn.
    pub compacted: bool,
    pub covers_up_to: usize,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub conversation_id: Uuid,
    pub model: String,
    pub turn_count: usize,
    pub digest: Option<Digest>,
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        Self {
            conversation_id: conversation.id(),
            model: conversation.model().to_string(),
            turn_count: conversation.turns().len(),
            digest: conversation.digest().cloned(),
        }
    }
}

pub async fn post_turn(
    State(state): State<ProxyState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TurnRequest>,
) -> Result<ApiResponse<TurnResponse>, AppError> {
    let started = Instant::now();
    let text = body.message.trim();
    if text.is_empty() {
        return Err(AppError::Validation("message is empty".to_string()));
    }

    let initial_model = body
        .model
        .clone()
        .unwrap_or_else(|| state.settings.default_model.clone());
    let mut conversation = state
        .conversations
        .try_acquire_or_insert_with(id, || Conversation::new(id, initial_model))?;

    let span = tracing::info_span!("conversation_turn", gen_ai.conversation.id = %id);
    async {
        let covered_before = conversation.covers_up_to();
        if let Some(model) = body.model.as_deref() {
            let outcome = state.context.on_model_changed(&mut conversation, model).await;
            debug!(?outcome, "Model selection applied");
        }

        let request = state
            .context
            .get_context_for_next_turn(&mut conversation, Turn::user(text))
            .await?;
        request.ensure_live_user_turn()?;

        let model = conversation.model().to_string();
        let completion = CompletionRequest {
            model: model.clone(),
            messages: request.to_messages(),
            system: None,
            max_tokens: state.settings.max_tokens,
            temperature: Some(state.settings.temperature),
            attachments: Vec::new(),
        };
        let response = state.provider.complete(&completion).await?;
        state
            .context
            .record_turn(&mut conversation, Turn::assistant(response.content.clone()));

        let covers_up_to = conversation.covers_up_to();
        let compacted = covers_up_to > covered_before;
        info!(model = %model, compacted, covers_up_to, "Conversation turn completed");

        Ok::<_, AppError>(ApiResponse::success(
            TurnResponse {
                conversation_id: id,
                response: response.content,
                model,
                compacted,
                covers_up_to,
                usage: response.usage,
            },
            started,
        ))
    }
    .instrument(span)
    .await
}

pub async fn get_conversation(
    State(state): State<ProxyState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ConversationView>, AppError> {
    let started = Instant::now();
    let conversation = state
        .conversations
        .try_acquire(&id)?
        .ok_or_else(|| AppError::NotFound(format!("conversation {id} not found")))?;
    Ok(ApiResponse::success(ConversationView::from(&*conversation), started))
}

pub async fn delete_conversation(
    State(state): State<ProxyState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.conversations.remove(&id) {
        return Err(AppError::NotFound(format!("conversation {id} not found")));
    }
    state
        .context
        .store()
        .delete(&id)
        .await
        .map_err(ContextError::from)?;
    info!(conversation_id = %id, "Conversation forgotten");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use parley_types::config::GlobalConfig;
    use parley_types::llm::{LlmError, MessageRole};

    use crate::http::handlers::testing::{body_json, proxy_state};

    fn turn(message: &str, model: Option<&str>) -> Json<TurnRequest> {
        Json(TurnRequest {
            message: message.to_string(),
            model: model.map(str::to_string),
        })
    }

    fn small_config(threshold: usize, keep_recent: usize) -> GlobalConfig {
        let mut config = GlobalConfig::default();
        config.context.threshold = threshold;
        config.context.keep_recent = keep_recent;
        config
    }

    #[tokio::test]
    async fn test_first_turn_creates_conversation() {
        let (state, requests) = proxy_state(&GlobalConfig::default(), None);
        let id = Uuid::now_v7();

        let resp = post_turn(State(state.clone()), Path(id), turn("hello", None))
            .await
            .unwrap();
        let body = body_json(resp.into_response()).await;
        assert_eq!(body["data"]["response"], "re: hello");
        assert_eq!(body["data"]["model"], "openai/gpt-4.1-mini");
        assert_eq!(body["data"]["compacted"], false);
        assert_eq!(body["data"]["usage"]["input_tokens"], 11);

        let view = get_conversation(State(state), Path(id)).await.unwrap();
        let body = body_json(view.into_response()).await;
        assert_eq!(body["data"]["turn_count"], 2);
        assert!(body["data"]["digest"].is_null());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_compacted_past_threshold() {
        let (state, requests) = proxy_state(&small_config(4, 2), None);
        let id = Uuid::now_v7();

        for message in ["one", "two"] {
            post_turn(State(state.clone()), Path(id), turn(message, None))
                .await
                .unwrap();
        }
        // 4 recorded turns + the pending one exceed the threshold of 4.
        let resp = post_turn(State(state.clone()), Path(id), turn("three", None))
            .await
            .unwrap();
        let body = body_json(resp.into_response()).await;
        assert_eq!(body["data"]["compacted"], true);
        assert_eq!(body["data"]["covers_up_to"], 3);

        let requests = requests.lock().unwrap();
        // turn, turn, summarize, turn
        assert_eq!(requests.len(), 4);
        let summarize = &requests[2];
        assert_eq!(summarize.model, GlobalConfig::default().context.summarizer_model);
        let last = &requests[3];
        assert_eq!(last.messages.len(), 3);
        assert_eq!(last.messages[0].role, MessageRole::User);
        assert_eq!(last.messages[2].content, "three");
    }

    #[tokio::test]
    async fn test_model_switch_folds_history() {
        let (state, requests) = proxy_state(&GlobalConfig::default(), None);
        let id = Uuid::now_v7();
        post_turn(State(state.clone()), Path(id), turn("hi", None))
            .await
            .unwrap();

        let resp = post_turn(State(state.clone()), Path(id), turn("again", Some("openai/o3")))
            .await
            .unwrap();
        let body = body_json(resp.into_response()).await;
        assert_eq!(body["data"]["model"], "openai/o3");
        assert_eq!(body["data"]["covers_up_to"], 2);
        assert_eq!(body["data"]["compacted"], true);

        let last = requests.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.model, "openai/o3");
        // digest entry + the new user turn
        assert_eq!(last.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_busy_conversation_is_rejected() {
        let (state, _) = proxy_state(&GlobalConfig::default(), None);
        let id = Uuid::now_v7();
        let _held = state
            .conversations
            .try_acquire_or_insert_with(id, || Conversation::new(id, "openai/o3"))
            .unwrap();

        let err = post_turn(State(state.clone()), Path(id), turn("hi", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Context(ContextError::Busy(busy)) if busy == id));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_gateway_failure_maps_to_bad_gateway() {
        let (state, _) = proxy_state(
            &GlobalConfig::default(),
            Some(|| LlmError::Overloaded("busy".to_string())),
        );
        let id = Uuid::now_v7();
        let err = post_turn(State(state.clone()), Path(id), turn("hi", None))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);

        // The lease was released, so the conversation can be inspected.
        assert!(get_conversation(State(state), Path(id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (state, _) = proxy_state(&GlobalConfig::default(), None);
        let err = post_turn(State(state), Path(Uuid::now_v7()), turn("   ", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_and_unknown_conversation() {
        let (state, _) = proxy_state(&GlobalConfig::default(), None);
        let id = Uuid::now_v7();
        post_turn(State(state.clone()), Path(id), turn("hi", None))
            .await
            .unwrap();

        assert_eq!(
            delete_conversation(State(state.clone()), Path(id)).await.unwrap(),
            StatusCode::NO_CONTENT
        );
        assert!(matches!(
            get_conversation(State(state.clone()), Path(id)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(delete_conversation(State(state), Path(id)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_drops_stored_digest() {
        let (state, _) = proxy_state(&GlobalConfig::default(), None);
        let id = Uuid::now_v7();
        post_turn(State(state.clone()), Path(id), turn("hi", None))
            .await
            .unwrap();
        post_turn(State(state.clone()), Path(id), turn("again", Some("openai/o3")))
            .await
            .unwrap();
        assert!(state.context.store().load(&id).await.unwrap().is_some());

        delete_conversation(State(state.clone()), Path(id)).await.unwrap();
        assert!(state.context.store().load(&id).await.unwrap().is_none());
        assert!(state.context.store().is_empty());

        // Reusing the id starts from scratch.
        let resp = post_turn(State(state.clone()), Path(id), turn("fresh", None))
            .await
            .unwrap();
        let body = body_json(resp.into_response()).await;
        assert_eq!(body["data"]["turn_count"], 2);
        assert_eq!(body["data"]["covers_up_to"], 0);
    }
}
