// src/handlers/assignments.rs

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assignment::{
            Assignment, CreateAssignmentRequest, NewAssignment, UpdateAssignmentRequest,
            check_window,
        },
        block::{CreateBlockRequest, NewBlock, QuestionBlock},
    },
    state::SharedStore,
    utils::access::Identity,
};

/// Assignment with its blocks, as instructors see it.
#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub blocks: Vec<QuestionBlock>,
}

/// Loads an assignment and checks the caller owns it.
async fn owned_assignment(
    store: &SharedStore,
    identity: &Identity,
    id: i64,
) -> Result<Assignment, AppError> {
    let assignment = store.get_assignment(id).await?;
    identity.ensure_owns(&assignment)?;
    Ok(assignment)
}

pub async fn create_assignment(
    State(store): State<SharedStore>,
    identity: Identity,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = store
        .insert_assignment(identity.user_id, NewAssignment::from(payload))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create assignment: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_assignments(
    State(store): State<SharedStore>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let assignments = store.list_assignments_by_instructor(identity.user_id).await?;
    Ok(Json(assignments))
}

pub async fn get_assignment(
    State(store): State<SharedStore>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = owned_assignment(&store, &identity, id).await?;
    let blocks = store.list_blocks(id).await?;
    Ok(Json(AssignmentDetail { assignment, blocks }))
}

/// Patches name, schedule or the open/assigned overrides.
pub async fn update_assignment(
    State(store): State<SharedStore>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut assignment = owned_assignment(&store, &identity, id).await?;
    payload.apply_to(&mut assignment);
    check_window(assignment.open_at, assignment.close_at)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    store.update_assignment(&assignment).await?;
    Ok(Json(assignment))
}

/// Appends a block. Its point total is the sum of its questions' points.
pub async fn create_block(
    State(store): State<SharedStore>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(payload): Json<CreateBlockRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    owned_assignment(&store, &identity, id).await?;

    let unique: HashSet<i64> = payload.question_ids.iter().copied().collect();
    if unique.len() != payload.question_ids.len() {
        return Err(AppError::BadRequest(
            "A question can appear only once per block".to_string(),
        ));
    }

    let questions = store.fetch_questions(&payload.question_ids).await?;
    if questions.len() != payload.question_ids.len() {
        return Err(AppError::BadRequest("Unknown question id in block".to_string()));
    }
    if questions.iter().any(|q| q.instructor_id != identity.user_id) {
        return Err(AppError::Forbidden(
            "Blocks may only use your own questions".to_string(),
        ));
    }

    let total_points: f64 = questions.iter().map(|q| q.points).sum();
    if payload.mastery_threshold > total_points {
        return Err(AppError::BadRequest(format!(
            "Mastery threshold {} exceeds block total {}",
            payload.mastery_threshold, total_points
        )));
    }

    let block = store
        .insert_block(NewBlock {
            assignment_id: id,
            question_ids: payload.question_ids,
            mastery_threshold: payload.mastery_threshold,
            total_points,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create block: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(block)))
}

/// Removes a block; later blocks shift down to stay contiguous.
/// Refused with 409 once any student has started the assignment.
pub async fn delete_block(
    State(store): State<SharedStore>,
    identity: Identity,
    Path((id, block_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    owned_assignment(&store, &identity, id).await?;
    store.delete_block(id, block_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Gradebook: every student's progress on one assignment.
pub async fn list_submissions(
    State(store): State<SharedStore>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_assignment(&store, &identity, id).await?;
    let submissions = store.list_submissions(id).await?;
    Ok(Json(submissions))
}
