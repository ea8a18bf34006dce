//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS (any origin, so browser front-ends can call the proxy
//! directly) and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::state::ProxyState;

/// Build the complete proxy router with all routes and middleware.
pub fn build_router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/models", get(handlers::models::list_models))
        // Stateless proxy: the caller owns the history
        .route("/chat", post(handlers::chat::chat))
        // Managed conversations
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation)
                .delete(handlers::conversation::delete_conversation),
        )
        .route(
            "/conversations/{id}/turns",
            post(handlers::conversation::post_turn),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parley_types::config::GlobalConfig;
    use tower::ServiceExt;

    use crate::http::handlers::testing::{body_json, proxy_state};

    #[tokio::test]
    async fn test_routes_are_mounted_under_api_v1() {
        let (state, _) = proxy_state(&GlobalConfig::default(), None);
        let router = build_router(state);

        let response = router
            .clone()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_turn_over_http() {
        let (state, _) = proxy_state(&GlobalConfig::default(), None);
        let router = build_router(state);
        let id = uuid::Uuid::now_v7();

        let response = router
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/conversations/{id}/turns"))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["response"], "re: ping");

        let response = router
            .oneshot(
                Request::get(format!("/api/v1/conversations/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"]["turn_count"], 2);
    }
}
