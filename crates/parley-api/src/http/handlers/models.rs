//! GET /api/v1/models

use std::time::Instant;

use axum::extract::State;
use serde::Serialize;

use parley_types::model::{MODEL_CATALOG, ModelInfo};

use crate::http::response::ApiResponse;
use crate::http::state::ProxyState;

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub default_model: String,
    pub models: &'static [ModelInfo],
}

pub async fn list_models(State(state): State<ProxyState>) -> ApiResponse<ModelList> {
    let started = Instant::now();
    ApiResponse::success(
        ModelList {
            default_model: state.settings.default_model.clone(),
            models: MODEL_CATALOG,
        },
        started,
    )
}
