//! HTTP API endpoints.
//!
//! Read-only views of the session and leaderboard, plus the endpoint the
//! advanced challenge page calls once it has been completed.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;
use crate::types::{LeaderboardRow, SessionSnapshot};
use crate::ws;

/// Body of an advanced challenge completion
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedCompletion {
    pub flag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvancedCompletionResponse {
    /// Points granted to the loaded team, if any
    pub granted: Option<u32>,
}

/// Routes shared by the binary and the tests
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/session", get(get_session))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/advanced/complete", post(post_advanced_completion))
        .with_state(state)
}

/// Current session snapshot.
///
/// GET /api/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.snapshot().await)
}

/// GET /api/leaderboard
pub async fn get_leaderboard(State(state): State<Arc<AppState>>) -> Json<Vec<LeaderboardRow>> {
    Json(state.compute_ranking().await)
}

/// Record an advanced challenge completion.
///
/// POST /api/advanced/complete
///
/// Accepted even when no team is loaded; the completion then waits for the
/// next registration or reload.
pub async fn post_advanced_completion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdvancedCompletion>,
) -> Response {
    match state.post_external_completion(&body.flag).await {
        Ok(granted) => (
            StatusCode::ACCEPTED,
            Json(AdvancedCompletionResponse { granted }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Rejected advanced challenge completion: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::store::LocalStorage;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Arc<AppState>, Router) {
        let store = Arc::new(LocalStorage::in_memory());
        let state = Arc::new(AppState::new(GameConfig::default(), store.clone(), store));
        (state.clone(), router(state))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn completion(flag: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/advanced/complete")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "flag": flag }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_endpoint_without_team() {
        let (_state, app) = app();

        let response = app
            .oneshot(Request::get("/api/session").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["team"].is_null());
        assert_eq!(json["phase"], "NOT_STARTED");
        assert_eq!(json["clock"], "01:30:00");
    }

    #[tokio::test]
    async fn test_advanced_completion_grants_points() {
        let (state, app) = app();
        state.register_team("Alpha").await.unwrap();

        let response = app
            .clone()
            .oneshot(completion("PPG{ADVANCED_CHALLENGE_COMPLETE}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["granted"], 20);

        let response = app
            .oneshot(Request::get("/api/leaderboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let rows = body_json(response).await;
        assert_eq!(rows[0]["name"], "Alpha");
        assert_eq!(rows[0]["score"], 20);
        assert_eq!(rows[0]["roundsSolved"], 1);
    }

    #[tokio::test]
    async fn test_blank_completion_is_rejected() {
        let (_state, app) = app();

        let response = app.oneshot(completion("   ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
