// src/web/handlers.rs

use super::{stream, AppState};
use crate::cancellation::CancellationToken;
use crate::errors::{Error, Result};
use crate::request::{self, FetchRequest, PathQuery};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;

/// `GET /{provider}/{owner}/{repo}[/{subPath...}]?ref=&timeout=`
pub(super) async fn get_handler(
    State(state): State<Arc<AppState>>,
    path: Option<Path<String>>,
    query: std::result::Result<Query<PathQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) =
        query.map_err(|e| Error::RequestMalformed(format!("Invalid query string: {}", e)))?;
    let path = path.map(|Path(p)| p).unwrap_or_default();
    tracing::info!("GET /{} ref={:?} timeout={:?}", path, query.git_ref, query.timeout);

    let request = request::from_path(&path, &query, &state.config)?;
    run_pipeline(&state, request).await
}

/// `POST /` with `{ "path", "repoURL", "targetRevision" }`.
pub(super) async fn post_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response> {
    let request = request::from_body(&body, &state.config)?;
    tracing::info!(
        "POST repoURL={} targetRevision={} path={:?}",
        request.spec.repo_url,
        request.spec.git_ref,
        request.spec.sub_path
    );
    run_pipeline(&state, request).await
}

pub(super) async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

/// Runs the blocking pipeline for `request` and streams the result.
///
/// The pipeline runs on the blocking pool. When a deadline applies and
/// passes first, the token is cancelled so the worker stops at its next
/// checkpoint and removes its workspace. Dropping this future (client gone)
/// cancels the token as well.
async fn run_pipeline(state: &AppState, request: FetchRequest) -> Result<Response> {
    let token = CancellationToken::new();
    let _cancel_guard = token.cancel_on_drop();

    let deadline = effective_deadline(state.config.enforce_timeout, request.timeout);
    let pipeline = state.config.pipeline.clone();
    let worker_token = token.clone();
    let spec = request.spec;

    let task = tokio::task::spawn_blocking(move || {
        crate::build_archive(&spec, &pipeline, deadline, &worker_token)
    });

    let joined = match deadline {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                token.cancel();
                return Err(Error::TimedOut {
                    seconds: limit.as_secs(),
                });
            }
        },
        None => task.await,
    };

    let archive = joined.map_err(|e| Error::Internal(format!("Pipeline worker failed: {}", e)))??;
    stream::send(archive).await
}

/// The deadline actually enforced: none when enforcement is off or the timeout is zero.
fn effective_deadline(enforce: bool, timeout: Duration) -> Option<Duration> {
    (enforce && !timeout.is_zero()).then_some(timeout)
}
