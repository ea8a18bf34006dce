//! Stateless chat proxy.
//!
//! POST /api/v1/chat
//!
//! The caller sends the whole history; the proxy adds the default system
//! prompt and attachment notes (done by the gateway client), forwards it, and
//! answers `{ "response": "..." }`. Any failure, including a malformed body,
//! answers 500 with `{ "error", "response" }` where `response` is an apology
//! the client can show as the assistant's reply.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use parley_core::chat::dialog::CompletionSettings;
use parley_types::llm::{Attachment, CompletionRequest, Message};

use crate::http::state::ProxyState;

/// Shown to the end user when the proxy cannot produce a reply.
pub const APOLOGY: &str =
    "Sorry, an error occurred while processing your request. Please try again.";

#[derive(Debug, Deserialize)]
pub struct ProxyChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl ProxyChatRequest {
    fn into_completion(self, settings: &CompletionSettings) -> CompletionRequest {
        CompletionRequest {
            model: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| settings.default_model.clone()),
            messages: self.messages,
            system: None,
            max_tokens: settings.max_tokens,
            temperature: Some(settings.temperature),
            attachments: self.attachments,
        }
    }
}

fn failure(error: impl ToString) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": error.to_string(), "response": APOLOGY })),
    )
        .into_response()
}

pub async fn chat(
    State(state): State<ProxyState>,
    payload: Result<Json<ProxyChatRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed chat request");
            return failure(rejection.body_text());
        }
    };

    let request = body.into_completion(&state.settings);
    info!(
        model = %request.model,
        messages = request.messages.len(),
        attachments = request.attachments.len(),
        "Proxying chat request"
    );

    match state.provider.complete(&request).await {
        Ok(response) => Json(json!({ "response": response.content })).into_response(),
        Err(e) => {
            warn!(model = %request.model, error = %e, "Chat proxy request failed");
            failure(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use parley_types::config::GlobalConfig;
    use parley_types::llm::{LlmError, MessageRole};

    use crate::http::handlers::testing::{body_json, proxy_state};

    async fn json_payload(raw: &str) -> Result<Json<ProxyChatRequest>, JsonRejection> {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(raw.to_string()))
            .unwrap();
        Json::<ProxyChatRequest>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn test_chat_returns_response_field() {
        let (state, requests) = proxy_state(&GlobalConfig::default(), None);
        let payload = json_payload(
            r#"{"messages":[{"role":"user","content":"hello"}],"model":"openai/o3"}"#,
        )
        .await;

        let response = chat(State(state), payload).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "re: hello");

        let sent = requests.lock().unwrap()[0].clone();
        assert_eq!(sent.model, "openai/o3");
        assert_eq!(sent.max_tokens, 3000);
        assert_eq!(sent.temperature, Some(0.7));
        assert_eq!(sent.messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_chat_defaults_model_and_forwards_attachments() {
        let (state, requests) = proxy_state(&GlobalConfig::default(), None);
        let payload = json_payload(
            r#"{"messages":[{"role":"user","content":"what is this?"}],
                "attachments":[{"name":"cat.png","type":"image/png","base64":"data:image/png;base64,AAAA"}]}"#,
        )
        .await;

        let response = chat(State(state), payload).await;
        assert_eq!(response.status(), StatusCode::OK);

        let sent = requests.lock().unwrap()[0].clone();
        assert_eq!(sent.model, "openai/gpt-4.1-mini");
        assert_eq!(sent.attachments.len(), 1);
        assert_eq!(sent.attachments[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_gateway_failure_returns_apology() {
        let (state, _) = proxy_state(&GlobalConfig::default(), Some(|| LlmError::Provider {
            message: "HTTP 500: upstream down".to_string(),
        }));
        let payload = json_payload(r#"{"messages":[{"role":"user","content":"hi"}]}"#).await;

        let response = chat(State(state), payload).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["response"], APOLOGY);
        assert!(body["error"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_malformed_body_returns_apology() {
        let (state, requests) = proxy_state(&GlobalConfig::default(), None);
        let payload = json_payload("{not json").await;
        assert!(payload.is_err());

        let response = chat(State(state), payload).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["response"], APOLOGY);
        assert!(requests.lock().unwrap().is_empty());
    }
}
