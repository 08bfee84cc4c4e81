use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::RegistryStore;
use super::domain::RegistrationId;
use super::overview::{RegistryOverview, DEFAULT_RECENT_ACTIVITIES};
use super::queue::{StatusFilter, VerificationQueue};
use super::search::search;
use crate::error::AppError;

const DEFAULT_OFFICER: &str = "Land Registry Officer";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueParams {
    status: Option<StatusFilter>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DecisionRequest {
    #[serde(default)]
    officer: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl DecisionRequest {
    fn officer(&self) -> &str {
        self.officer.as_deref().unwrap_or(DEFAULT_OFFICER)
    }
}

/// Public verification, the admin queue and the dashboard overview.
pub fn registry_router<S>(queue: Arc<VerificationQueue<S>>) -> Router
where
    S: RegistryStore + 'static,
{
    Router::new()
        .route("/api/v1/verification/search", get(search_handler::<S>))
        .route("/api/v1/verification/queue", get(queue_handler::<S>))
        .route(
            "/api/v1/verification/queue/:registration_id",
            get(detail_handler::<S>),
        )
        .route(
            "/api/v1/verification/queue/:registration_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/verification/queue/:registration_id/reject",
            post(reject_handler::<S>),
        )
        .route("/api/v1/registry/overview", get(overview_handler::<S>))
        .with_state(queue)
}

pub(crate) async fn search_handler<S>(
    State(queue): State<Arc<VerificationQueue<S>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    S: RegistryStore + 'static,
{
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        let payload = json!({ "error": "Please enter a plot number, survey number or token id" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match search(queue.store().as_ref(), &query) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => {
            let payload = json!({ "error": format!("no property matches '{}'", query.trim()) });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn queue_handler<S>(
    State(queue): State<Arc<VerificationQueue<S>>>,
    Query(params): Query<QueueParams>,
) -> Response
where
    S: RegistryStore + 'static,
{
    let filter = params.status.unwrap_or_default();
    let payload = json!({
        "filter": filter,
        "counts": queue.counts(),
        "registrations": queue.list(filter),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn detail_handler<S>(
    State(queue): State<Arc<VerificationQueue<S>>>,
    Path(registration_id): Path<u32>,
) -> Response
where
    S: RegistryStore + 'static,
{
    match queue.detail(RegistrationId(registration_id)) {
        Ok(registration) => (StatusCode::OK, Json(registration)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn approve_handler<S>(
    State(queue): State<Arc<VerificationQueue<S>>>,
    Path(registration_id): Path<u32>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    S: RegistryStore + 'static,
{
    match queue
        .approve(RegistrationId(registration_id), request.officer())
        .await
    {
        Ok(registration) => (StatusCode::OK, Json(registration)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn reject_handler<S>(
    State(queue): State<Arc<VerificationQueue<S>>>,
    Path(registration_id): Path<u32>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    S: RegistryStore + 'static,
{
    let officer = request.officer().to_string();
    match queue
        .reject(RegistrationId(registration_id), &officer, request.note)
        .await
    {
        Ok(registration) => (StatusCode::OK, Json(registration)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn overview_handler<S>(State(queue): State<Arc<VerificationQueue<S>>>) -> Response
where
    S: RegistryStore + 'static,
{
    let overview = RegistryOverview::collect(queue.store().as_ref(), DEFAULT_RECENT_ACTIVITIES);
    (StatusCode::OK, Json(overview)).into_response()
}
