//! HTTP handlers for the relay API.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{OriginalUri, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use super::api::{MetaResponse, RunQuery, StatusResponse};
use super::prereq::probe_prerequisites;
use super::router::RUN_ID_HEADER;
use super::state::{AppState, RunGuard};
use super::ApiError;
use crate::config::{BuildConfig, BuildRequest};
use crate::display;
use crate::process::Supervisor;
use crate::shell::{EnvOverlay, InvocationPlan};
use crate::stream::{DeliveryMode, Emitter, StreamRecord};

/// Environment flag telling the bootstrap script to stop after fetching
/// dependencies.
pub const BOOTSTRAP_ONLY_KEY: &str = "MINREND_BOOTSTRAP_ONLY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Build,
    Bootstrap,
}

impl Job {
    fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Bootstrap => "bootstrap",
        }
    }
}

/// GET /api/meta - Host platform information.
pub async fn get_meta(State(state): State<AppState>) -> Json<MetaResponse> {
    let platform = state.resolver.platform();
    Json(MetaResponse {
        ok: true,
        platform,
        arch: std::env::consts::ARCH,
        os_label: platform.os_label(),
    })
}

/// GET /api/status - Prerequisite presence and overall readiness.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(probe_prerequisites(
        &state.config.project_root,
        &state.config.prerequisites,
    ))
}

/// POST /api/build - Write `build.config` and run the build script.
pub async fn post_build(
    State(state): State<AppState>,
    query: Result<Query<RunQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let request = BuildRequest::parse(&body)?;
    let build_config = BuildConfig::from_request(request, &state.config.defaults)?;
    let guard = state.begin_run()?;

    build_config.write(&state.config.config_path()).await?;
    tracing::info!(
        app_dir = build_config.app_dir(),
        out_name = build_config.out_name(),
        "Build requested"
    );

    let plan = state
        .resolver
        .resolve(
            &state.config.project_root,
            &state.config.scripts.build,
            build_config.env_overlay(),
        )
        .await?;
    let mode = DeliveryMode::negotiate(accept(&headers), query.stream);
    Ok(run_job(&state, Job::Build, plan, mode, query.stages, guard).await)
}

/// POST /api/bootstrap - Fetch and prepare build dependencies only.
pub async fn post_bootstrap(
    State(state): State<AppState>,
    query: Result<Query<RunQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let guard = state.begin_run()?;
    tracing::info!("Bootstrap requested");

    let env = EnvOverlay::from([(BOOTSTRAP_ONLY_KEY.to_string(), "1".to_string())]);
    let plan = state
        .resolver
        .resolve(
            &state.config.project_root,
            &state.config.scripts.bootstrap,
            env,
        )
        .await?;
    let mode = DeliveryMode::negotiate(accept(&headers), query.stream);
    Ok(run_job(&state, Job::Bootstrap, plan, mode, query.stages, guard).await)
}

/// OPTIONS on any API route.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

fn accept(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
}

async fn run_job(
    state: &AppState,
    job: Job,
    plan: InvocationPlan,
    mode: DeliveryMode,
    stages: bool,
    guard: RunGuard,
) -> Response {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id, job = job.as_str(), mode = ?mode);
    let cancel = state.cancel.child_token();
    let handle = span.in_scope(|| Supervisor::start(plan, cancel.clone()));
    let run_label = run_id.to_string();
    display::print_run_start(job.as_str(), &run_label, &handle.plan().display_command());
    let emitter = Emitter::new().with_stages(stages);

    let mut response = match mode {
        DeliveryMode::Live => {
            // Dropping the stream (client gone) cancels the run.
            let records = emitter.live(handle, (cancel.drop_guard(), guard, span));
            let events = records.map(move |record| {
                if let StreamRecord::Done(result) = &record {
                    display::print_run_end(job.as_str(), &run_label, result);
                }
                Ok::<_, Infallible>(sse_event(&record))
            });
            Sse::new(events)
                .keep_alive(KeepAlive::default())
                .into_response()
        }
        DeliveryMode::Buffered => {
            let _cancel_on_drop = cancel.drop_guard();
            let result = emitter.collect(handle).instrument(span).await;
            drop(guard);
            display::print_run_end(job.as_str(), &run_label, &result);
            let status = if result.error.is_some() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(result)).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&run_id.to_string()) {
        response.headers_mut().insert(RUN_ID_HEADER, value);
    }
    response
}

fn sse_event(record: &StreamRecord) -> Event {
    match record.to_json() {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::warn!(error = %e, kind = record.kind(), "Failed to serialize stream record");
            Event::default().comment("record dropped")
        }
    }
}
