// src/handlers/attempts.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    attempt::AttemptController,
    error::AppError,
    models::{assignment::Assignment, submission::SubmitAnswersRequest},
    state::AppState,
    utils::access::Identity,
};

/// Assignment summary for the student dashboard.
#[derive(Debug, Serialize)]
pub struct AvailableAssignment {
    pub id: i64,
    pub name: String,
    pub due_at: Option<chrono::DateTime<Utc>>,
    pub close_at: Option<chrono::DateTime<Utc>>,
    pub total_points: f64,
    pub num_blocks: i32,
    pub is_open: bool,
}

impl AvailableAssignment {
    fn from_assignment(a: Assignment, now: chrono::DateTime<Utc>) -> Self {
        Self {
            is_open: a.is_open_at(now),
            id: a.id,
            name: a.name,
            due_at: a.due_at,
            close_at: a.close_at,
            total_points: a.total_points,
            num_blocks: a.num_blocks,
        }
    }
}

fn controller(state: &AppState) -> AttemptController<'_> {
    AttemptController::new(
        state.store.as_ref(),
        state.media.as_ref(),
        &state.config.media_bucket,
        state.config.signed_url_ttl,
    )
}

/// Lists assignments currently assigned to students.
pub async fn list_available(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let assignments: Vec<AvailableAssignment> = state
        .store
        .list_assignments()
        .await?
        .into_iter()
        .filter(|a| a.is_assigned_at(now))
        .map(|a| AvailableAssignment::from_assignment(a, now))
        .collect();
    Ok(Json(assignments))
}

/// Enters (or resumes) an assignment. Finished assignments return results instead.
pub async fn start_attempt(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = controller(&state).start(identity.user_id, id).await?;
    Ok(Json(view))
}

/// Grades the current block version.
pub async fn submit_attempt(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = controller(&state)
        .submit(identity.user_id, id, payload.answers)
        .await?;
    Ok(Json(view))
}

/// Retry, next block or finish, depending on the last graded attempt.
pub async fn advance_attempt(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = controller(&state).advance(identity.user_id, id).await?;
    Ok(Json(view))
}

pub async fn get_results(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = controller(&state).results(identity.user_id, id).await?;
    Ok(Json(results))
}
