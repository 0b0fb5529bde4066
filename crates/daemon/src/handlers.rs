// SPDX-License-Identifier: MIT

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use noa_core::{Run, RunId};
use noa_storage::LockState;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state handed to every route: the admission lock and the
/// coordinator that runs admitted runs in the background.
#[derive(Clone)]
pub struct AppState {
    pub lock: Arc<noa_storage::StateLock>,
    pub coordinator: Arc<noa_engine::Coordinator>,
}

/// `POST /node-observability-pprof` or `/node-observability-scripting`.
pub async fn start_run(State(state): State<AppState>) -> impl IntoResponse {
    match state.lock.try_acquire() {
        Ok((id, LockState::Free)) => {
            info!(run_id = %id, "run admitted");
            let coordinator = Arc::clone(&state.coordinator);
            tokio::spawn(async move {
                coordinator.run(id).await;
            });
            (StatusCode::OK, Json(Run::new(id))).into_response()
        }
        Ok((id, LockState::Taken)) => {
            (StatusCode::CONFLICT, format!("{id} still running")).into_response()
        }
        Ok((id, LockState::InError)) => failed_response(id).into_response(),
        Err(err) => {
            error!(error = %err, "try_acquire failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

/// `GET /node-observability-status`.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    match state.lock.inspect() {
        Ok((_, LockState::Free)) => (StatusCode::OK, "Service is ready").into_response(),
        Ok((id, LockState::Taken)) => {
            (StatusCode::CONFLICT, format!("{id} still running")).into_response()
        }
        Ok((id, LockState::InError)) => failed_response(id).into_response(),
        Err(err) => {
            error!(error = %err, "inspect failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

/// The 500 body for an `InError` lock. A nil identifier means the marker
/// file exists but could not be parsed, so the body is generic rather
/// than naming an identifier that was never recovered.
fn failed_response(id: RunId) -> (StatusCode, String) {
    if id.is_nil() {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error: error marker is unparseable".into())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{id} failed."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use noa_engine::{Collectors, Coordinator, Mode};
    use tower::ServiceExt;

    fn test_state(dir: &std::path::Path) -> AppState {
        let lock = Arc::new(noa_storage::StateLock::new(dir.join("agent.err")));
        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&lock),
            Collectors::Scripting { script: Arc::from("true") },
            dir.to_path_buf(),
        ));
        AppState { lock, coordinator }
    }

    #[tokio::test]
    async fn free_lock_admits_and_returns_json_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let router = crate::router(Mode::Scripting, state);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/node-observability-scripting")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["ID"].is_string());
        assert_eq!(json["ExecutionRuns"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn taken_lock_returns_409_with_holder_id() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (held_id, _) = state.lock.try_acquire().unwrap();
        let router = crate::router(Mode::Scripting, state);

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/node-observability-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, format!("{held_id} still running").into_bytes());
    }

    #[tokio::test]
    async fn in_error_lock_returns_500_with_trailing_period() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (id, _) = state.lock.try_acquire().unwrap();
        let mut run = Run::new(id);
        let now = chrono::Utc::now();
        run.push(noa_core::TaskOutcome::failure(
            noa_core::TaskKind::Kubelet,
            now,
            now,
            "boom",
        ));
        state.lock.commit_error(&run).unwrap();
        state.lock.release();

        let router = crate::router(Mode::Profiling, state);
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/node-observability-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, format!("{id} failed.").into_bytes());
    }
}
