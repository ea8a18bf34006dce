use axum::Json;
use axum::extract::State;

use crate::http::state::ProxyState;

/// GET /api/v1/health
pub async fn health_check(State(state): State<ProxyState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.provider.name(),
        "conversations": state.conversations.len(),
    }))
}
