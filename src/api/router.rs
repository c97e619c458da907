use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::routes::{cache, chains, workflow};
use super::state::AppState;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/run-workflow", post(workflow::run_workflow))
        .route("/history", get(workflow::history))
        .route("/chains", get(chains::list_chains).post(chains::create_chain))
        .route("/chains/run", post(chains::run_chain))
        .route("/chains/{id}", get(chains::get_chain))
        .route("/chains/{id}/execute", post(chains::execute_chain))
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache/clear", delete(cache::cache_clear));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::action::ActionKind;
    use crate::domain::cache::ResponseCache;
    use crate::domain::chain::{Chain, ChainRepository, ChainStep};
    use crate::domain::provider::{DataFetcher, TextGenerator};
    use crate::domain::DomainError;
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::chain::{
        ChainExecutorImpl, InMemoryChainRepository, InMemoryRunRecordRepository,
    };

    struct StubFetcher;

    impl fmt::Debug for StubFetcher {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("StubFetcher").finish()
        }
    }

    #[async_trait::async_trait]
    impl DataFetcher for StubFetcher {
        async fn fetch(&self, action: ActionKind, _prompt: &str) -> Result<String, DomainError> {
            Ok(format!("{} data", action))
        }
    }

    struct StubGenerator;

    impl fmt::Debug for StubGenerator {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("StubGenerator").finish()
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, DomainError> {
            Ok("generated".to_string())
        }
    }

    fn test_state() -> AppState {
        let cache = ResponseCache::new(Arc::new(InMemoryCache::new()));
        let chains = Arc::new(InMemoryChainRepository::new());
        let runs = Arc::new(InMemoryRunRecordRepository::new());

        let executor = Arc::new(ChainExecutorImpl::new(
            Arc::new(StubFetcher),
            Arc::new(StubGenerator),
            cache.clone(),
            chains.clone(),
            runs.clone(),
        ));

        AppState {
            executor,
            chains,
            runs,
            cache,
            debug_endpoints: true,
        }
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cache_backend"], "memory");
    }

    #[tokio::test]
    async fn test_run_chain_wire_contract() {
        let app = create_router(test_state());
        let request = json_request(
            Method::POST,
            "/api/chains/run",
            serde_json::json!({
                "prompt": "developer daily brief",
                "actions": [{"type": "weather"}, {"type": "news"}]
            }),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["chainName"], "Ad-hoc Chain");
        assert_eq!(json["totalSteps"], 2);
        assert_eq!(json["completedSteps"], 2);
        assert_eq!(json["failedSteps"], 0);
        assert_eq!(json["isAdHoc"], true);
        assert!(json.get("chainId").is_none());
        assert!(json.get("executedAt").is_some());
        assert!(json["summary"].as_str().unwrap().contains("✅ Completed: 2/2 steps"));

        let first = &json["results"][0];
        assert_eq!(first["step"], 1);
        assert_eq!(first["action"], "weather");
        assert_eq!(first["ai_response"], "generated");
        assert_eq!(first["api_response"], "weather data");
        assert_eq!(first["final_result"], "generated weather data #weather");
        assert_eq!(first["cached"], false);
        assert!(first.get("prompt").is_some());
        assert!(first.get("timestamp").is_some());
        assert!(first.get("execution_time_ms").is_some());
    }

    #[tokio::test]
    async fn test_run_chain_rejects_invalid_prompt() {
        let app = create_router(test_state());
        let request = json_request(
            Method::POST,
            "/api/chains/run",
            serde_json::json!({"prompt": "", "actions": [{"type": "news"}]}),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_execute_public_chain() {
        let app = create_router(test_state());
        let request = json_request(
            Method::POST,
            "/api/chains/public-1/execute",
            serde_json::json!({"prompt": "brief"}),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["chainId"], "public-1");
        assert_eq!(json["chainName"], "Weather & News Update");
        assert_eq!(json["isPublic"], true);
    }

    #[tokio::test]
    async fn test_execute_unknown_public_chain_is_404() {
        let app = create_router(test_state());
        let request = json_request(
            Method::POST,
            "/api/chains/public-999/execute",
            serde_json::json!({"prompt": "brief"}),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_chain_requires_identity() {
        let app = create_router(test_state());
        let body = serde_json::json!({
            "name": "Mine",
            "actions": [{"type": "weather"}]
        });

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/chains", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let mut request = json_request(Method::POST, "/api/chains", body);
        request
            .headers_mut()
            .insert("x-user-id", "user-1".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = response_json(response).await;
        assert_eq!(json["chain"]["name"], "Mine");
        assert_eq!(json["chain"]["executionCount"], 0);
    }

    #[tokio::test]
    async fn test_named_execution_enforces_ownership_over_http() {
        let state = test_state();
        let chain = Chain::new(
            "Mine",
            "",
            vec![ChainStep::new(ActionKind::News)],
            Some("user-1".to_string()),
        );
        state.chains.create(&chain).await.unwrap();
        let app = create_router(state);

        let mut request = json_request(
            Method::POST,
            &format!("/api/chains/{}/execute", chain.id),
            serde_json::json!({"prompt": "p"}),
        );
        request
            .headers_mut()
            .insert("x-user-id", "user-2".parse().unwrap());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_chains_anonymous_serves_catalog() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::get("/api/chains").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["id"], "public-1");
    }

    #[tokio::test]
    async fn test_run_workflow_single_action() {
        let app = create_router(test_state());
        let request = json_request(
            Method::POST,
            "/api/run-workflow",
            serde_json::json!({"prompt": "weather in Delhi", "action": "weather"}),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["action"], "weather");
        assert_eq!(json["final_result"], "generated weather data #weather");
        assert_eq!(json["cached"], false);
    }

    #[tokio::test]
    async fn test_history_scoped_by_identity() {
        let app = create_router(test_state());

        let mut request = json_request(
            Method::POST,
            "/api/chains/run",
            serde_json::json!({"prompt": "p", "actions": [{"type": "news"}]}),
        );
        request
            .headers_mut()
            .insert("x-user-id", "user-1".parse().unwrap());
        app.clone().oneshot(request).await.unwrap();

        // user-2 sees nothing; user-1 sees their own step record.
        let mut request = Request::get("/api/history").body(Body::empty()).unwrap();
        request
            .headers_mut()
            .insert("x-user-id", "user-2".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        let json = response_json(response).await;
        assert_eq!(json["history"].as_array().unwrap().len(), 0);

        let mut request = Request::get("/api/history").body(Body::empty()).unwrap();
        request
            .headers_mut()
            .insert("x-user-id", "user-1".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        let json = response_json(response).await;
        let history = json["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["action"], "news");
        assert_eq!(history[0]["final_result"], "generated news data #news");

        // Anonymous callers see all recent records.
        let response = app
            .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_endpoints_respect_debug_gate() {
        let mut state = test_state();
        state.debug_endpoints = false;
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(Request::get("/api/cache/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let enabled = create_router(test_state());
        let response = enabled
            .clone()
            .oneshot(Request::get("/api/cache/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["backend"], "memory");

        let response = enabled
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/cache/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
